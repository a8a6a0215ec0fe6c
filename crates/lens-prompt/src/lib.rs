//! Prompt template management for tickerlens
//!
//! Templates carry one variant per [`Language`] and interpolate variables with
//! Jinja2 syntax through MiniJinja.
//!
//! # Quick Start
//!
//! ```
//! use lens_prompt::{JinjaTemplate, Language, PromptTemplate};
//! use serde_json::json;
//!
//! let template = JinjaTemplate::bilingual(
//!     "greeting",
//!     "Analyze {{ symbol }}",
//!     "分析 {{ symbol }}",
//! ).unwrap();
//!
//! let en = template.render(&Language::English, &json!({ "symbol": "2330.TW" })).unwrap();
//! assert_eq!(en, "Analyze 2330.TW");
//!
//! let zh = template.render(&Language::TraditionalChinese, &json!({ "symbol": "2330.TW" })).unwrap();
//! assert_eq!(zh, "分析 2330.TW");
//! ```

mod error;
mod jinja;
mod language;
mod template;

pub use error::{PromptError, Result};
pub use jinja::{JinjaTemplate, JinjaTemplateBuilder};
pub use language::Language;
pub use template::PromptTemplate;
