//! Language support for prompts and user-facing text

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported languages
///
/// # Examples
///
/// ```
/// use lens_prompt::Language;
///
/// assert_eq!(Language::from_code("zh-TW"), Language::TraditionalChinese);
/// assert_eq!(Language::TraditionalChinese.code(), "zh-TW");
/// assert_eq!(Language::from_code("ja"), Language::Other("ja".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    /// English
    English,
    /// Chinese (Traditional, Taiwan)
    #[default]
    TraditionalChinese,
    /// Other languages (ISO 639-1 code)
    Other(String),
}

impl Language {
    /// Get the language tag
    pub fn code(&self) -> &str {
        match self {
            Language::English => "en",
            Language::TraditionalChinese => "zh-TW",
            Language::Other(code) => code,
        }
    }

    /// Get language name for display
    pub fn name(&self) -> &str {
        match self {
            Language::English => "English",
            Language::TraditionalChinese => "繁體中文",
            Language::Other(code) => code,
        }
    }

    /// Parse from a language tag or common name
    pub fn from_code(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Language::English,
            "zh" | "zh-tw" | "zh-hant" | "chinese" | "中文" | "繁體中文" => {
                Language::TraditionalChinese
            }
            other => Language::Other(other.to_string()),
        }
    }

    /// Pick between an English and a Chinese string
    ///
    /// Unknown languages fall back to English.
    pub fn pick<'a>(&self, english: &'a str, chinese: &'a str) -> &'a str {
        match self {
            Language::TraditionalChinese => chinese,
            _ => english,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Language::from_code(s)
    }
}
