//! Error types for the analysis pipeline

use chrono::NaiveDate;
use lens_llm::LLMError;
use lens_prompt::PromptError;
use thiserror::Error;

/// Problems with what the user typed into the form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("ticker symbol is empty")]
    EmptyTicker,

    #[error("end date {end} is before start date {start}")]
    ReversedRange { start: NaiveDate, end: NaiveDate },

    #[error("date {0} is out of range")]
    DateOutOfRange(NaiveDate),
}

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// User supplied input that cannot be acted on
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// The provider returned zero rows
    #[error("No data for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: String,
        end: String,
    },

    /// The market data provider failed
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Table shape is inconsistent (column length, duplicate names)
    #[error("Table error: {0}")]
    TableError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Font provisioning failed
    #[error("Font error: {0}")]
    FontError(String),

    /// Commentary generation failed
    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    /// Commentary prompt could not be rendered
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

impl StockError {
    /// Whether the failure happened in the AI commentary stage
    pub fn is_commentary(&self) -> bool {
        matches!(self, StockError::Llm(_) | StockError::Prompt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: StockError = InputError::EmptyTicker.into();
        assert_eq!(err.to_string(), "Invalid input: ticker symbol is empty");

        let err = StockError::NoData {
            symbol: "ZZZZ.TW".to_string(),
            start: "2024-01-01".to_string(),
            end: "2024-06-30".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No data for ZZZZ.TW between 2024-01-01 and 2024-06-30"
        );
    }

    #[test]
    fn test_llm_error_conversion() {
        let err: StockError = LLMError::RateLimitExceeded("quota".to_string()).into();
        assert!(err.is_commentary());
        assert!(err.to_string().contains("quota"));

        let err = StockError::MissingColumn("Close".to_string());
        assert!(!err.is_commentary());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: StockError = io.into();
        assert!(matches!(err, StockError::Io(_)));
    }
}
