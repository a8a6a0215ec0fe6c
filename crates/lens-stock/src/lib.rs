//! Stock analysis pipeline for tickerlens
//!
//! This crate implements everything behind the dashboard's single action button:
//!
//! - Data acquisition of daily OHLCV bars (Yahoo Finance) with column normalization
//! - Indicator computation: RSI(14) with Wilder smoothing and MACD(12,26,9)
//! - Chart specifications for close price, RSI and MACD
//! - Font provisioning for CJK chart text
//! - Optional AI commentary through any [`lens_llm::LLMProvider`]
//!
//! # Architecture
//!
//! [`AnalysisPipeline`] runs the stages in order for one [`AnalysisQuery`] and
//! collects user-facing [`Banner`]s along the way. Every stage returns a
//! [`Result`]; a failed stage becomes an error banner and ends the run, except
//! for commentary, whose failure leaves the charts in place.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_stock::{AnalysisPipeline, AnalysisQuery, YahooFinanceClient};
//! use std::sync::Arc;
//!
//! let pipeline = AnalysisPipeline::new(Arc::new(YahooFinanceClient::new()), Default::default());
//! let run = pipeline.run(&AnalysisQuery::new("2330.TW", start, end)).await;
//! for banner in &run.banners {
//!     println!("{banner}");
//! }
//! ```

pub mod acquisition;
pub mod api;
pub mod charts;
pub mod commentary;
pub mod config;
pub mod error;
pub mod font;
pub mod indicators;
pub mod pipeline;
pub mod status;
pub mod table;

// Re-export main types for convenience
pub use api::{BarProvider, YahooFinanceClient};
pub use charts::{ChartSet, ChartSpec};
pub use commentary::Commentator;
pub use config::{CommentarySettings, DashboardConfig, FontPolicy, FontSettings};
pub use error::{InputError, Result, StockError};
pub use font::{ChartTheme, FontProvision, FontProvisioner};
pub use pipeline::{AnalysisPipeline, AnalysisQuery, AnalysisRun, RunOutcome};
pub use status::{Banner, BannerLevel};
pub use table::{PriceTable, RawTable};

pub use lens_prompt::Language;
