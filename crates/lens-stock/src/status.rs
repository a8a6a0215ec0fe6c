//! User-facing status banners

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a banner shown in the main panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BannerLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl BannerLevel {
    /// Short tag used when a banner is written to the log or a terminal
    pub fn tag(self) -> &'static str {
        match self {
            BannerLevel::Info => "info",
            BannerLevel::Success => "ok",
            BannerLevel::Warning => "warn",
            BannerLevel::Error => "error",
        }
    }
}

/// A message addressed to the user, as opposed to tracing output for the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

impl Banner {
    pub fn new(level: BannerLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(BannerLevel::Error, text)
    }

    pub fn is_error(&self) -> bool {
        self.level == BannerLevel::Error
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.tag(), self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_display() {
        let banner = Banner::success("Fetched 120 rows");
        assert_eq!(banner.to_string(), "[ok] Fetched 120 rows");
        assert!(!banner.is_error());
        assert!(Banner::error("boom").is_error());
    }
}
