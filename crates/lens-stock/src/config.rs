//! Configuration for the dashboard and its analysis pipeline

use crate::error::{Result, StockError};
use chrono::NaiveDate;
use lens_prompt::Language;
use lens_utils::SecretStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the CJK font file
pub const DEFAULT_FONT_PATH: &str = "TaipeiSansTCBeta-Regular.ttf";

/// Family name the font is registered under
pub const DEFAULT_FONT_FAMILY: &str = "Taipei Sans TC Beta";

/// Where the font is downloaded from when it is missing
pub const DEFAULT_FONT_URL: &str =
    "https://drive.google.com/uc?id=1eGAsTN1HBpJAkeVM57_C7ccp7hbgSz3_&export=download";

/// Secret holding the generative-AI API key
pub const DEFAULT_API_KEY_NAME: &str = "GEMINI_API_KEY";

/// Default generative model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// What to do when the font file is not on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontPolicy {
    /// Fetch the font over HTTP; failures degrade text rendering but never block runs
    Download { url: String },
    /// Refuse to start any run until the file is placed by hand
    RequireLocal { hint: String },
}

impl Default for FontPolicy {
    fn default() -> Self {
        Self::Download {
            url: DEFAULT_FONT_URL.to_string(),
        }
    }
}

/// Font provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSettings {
    pub path: PathBuf,
    pub family: String,
    pub policy: FontPolicy,
    /// Draw negative tick labels with an ASCII hyphen instead of U+2212
    pub ascii_minus: bool,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FONT_PATH),
            family: DEFAULT_FONT_FAMILY.to_string(),
            policy: FontPolicy::default(),
            ascii_minus: true,
        }
    }
}

/// Settings for the AI commentary stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentarySettings {
    pub model: String,
    pub max_output_tokens: usize,
    pub temperature: Option<f32>,
    /// Name of the secret holding the API key
    pub api_key_name: String,
}

impl Default for CommentarySettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: 2048,
            temperature: None,
            api_key_name: DEFAULT_API_KEY_NAME.to_string(),
        }
    }
}

/// Configuration for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Language of banners, chart labels and the AI prompt
    pub language: Language,

    /// Ticker pre-filled in the sidebar
    pub default_ticker: String,

    /// Start date pre-filled in the sidebar
    pub default_start: NaiveDate,

    pub font: FontSettings,

    pub commentary: CommentarySettings,

    /// Timeout for every outbound HTTP request
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            language: Language::TraditionalChinese,
            default_ticker: "2330.TW".to_string(),
            default_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            font: FontSettings::default(),
            commentary: CommentarySettings::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.font.path.as_os_str().is_empty() {
            return Err(StockError::ConfigError(
                "font path must not be empty".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.commentary.max_output_tokens == 0 {
            return Err(StockError::ConfigError(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if matches!(&self.font.policy, FontPolicy::Download { url } if url.trim().is_empty()) {
            return Err(StockError::ConfigError(
                "font download URL must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the AI API key from `secrets`, then the environment
    pub fn api_key(&self, secrets: &SecretStore) -> Option<String> {
        secrets.resolve(&self.commentary.api_key_name)
    }
}

/// Builder for DashboardConfig
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    language: Option<Language>,
    default_ticker: Option<String>,
    default_start: Option<NaiveDate>,
    font_path: Option<PathBuf>,
    font_family: Option<String>,
    font_policy: Option<FontPolicy>,
    ascii_minus: Option<bool>,
    model: Option<String>,
    max_output_tokens: Option<usize>,
    temperature: Option<f32>,
    api_key_name: Option<String>,
    request_timeout: Option<Duration>,
}

impl DashboardConfigBuilder {
    /// Set the UI and prompt language
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Set the ticker pre-filled in the sidebar
    pub fn default_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.default_ticker = Some(ticker.into());
        self
    }

    /// Set the start date pre-filled in the sidebar
    pub fn default_start(mut self, date: NaiveDate) -> Self {
        self.default_start = Some(date);
        self
    }

    /// Set the font file location
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    /// Set the missing-font policy
    pub fn font_policy(mut self, policy: FontPolicy) -> Self {
        self.font_policy = Some(policy);
        self
    }

    pub fn ascii_minus(mut self, enabled: bool) -> Self {
        self.ascii_minus = Some(enabled);
        self
    }

    /// Set the generative model name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_output_tokens(mut self, tokens: usize) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the name of the secret holding the API key
    pub fn api_key_name(mut self, name: impl Into<String>) -> Self {
        self.api_key_name = Some(name.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DashboardConfig> {
        let defaults = DashboardConfig::default();

        let config = DashboardConfig {
            language: self.language.unwrap_or(defaults.language),
            default_ticker: self.default_ticker.unwrap_or(defaults.default_ticker),
            default_start: self.default_start.unwrap_or(defaults.default_start),
            font: FontSettings {
                path: self.font_path.unwrap_or(defaults.font.path),
                family: self.font_family.unwrap_or(defaults.font.family),
                policy: self.font_policy.unwrap_or(defaults.font.policy),
                ascii_minus: self.ascii_minus.unwrap_or(defaults.font.ascii_minus),
            },
            commentary: CommentarySettings {
                model: self.model.unwrap_or(defaults.commentary.model),
                max_output_tokens: self
                    .max_output_tokens
                    .unwrap_or(defaults.commentary.max_output_tokens),
                temperature: self.temperature.or(defaults.commentary.temperature),
                api_key_name: self.api_key_name.unwrap_or(defaults.commentary.api_key_name),
            },
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}
