//! tickerlens desktop dashboard
//!
//! Fetches daily bars for one ticker, charts RSI(14) and MACD(12,26,9), and,
//! when an API key is configured, asks a generative model for a written report.
//!
//! # Usage
//!
//! ```bash
//! # Optional: enable AI commentary
//! echo 'GEMINI_API_KEY="your-key"' > secrets.env
//!
//! cargo run --bin tickerlens -p lens-app -- --ticker 2330.TW
//! ```

mod app;
mod fonts;
mod plot;
mod report;
mod strings;

use anyhow::Context as _;
use app::{DashboardApp, KeyNotice, QueryForm, Startup};
use chrono::Local;
use clap::{Parser, ValueEnum};
use lens_llm::LLMProvider;
use lens_llm::providers::{GeminiConfig, GeminiProvider, OpenAIConfig, OpenAIProvider};
use lens_prompt::Language;
use lens_stock::config::DEFAULT_FONT_URL;
use lens_stock::{
    AnalysisPipeline, Commentator, DashboardConfig, FontPolicy, FontProvisioner, YahooFinanceClient,
};
use lens_utils::SecretStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    /// Google Gemini generateContent
    Gemini,
    /// Any OpenAI-compatible chat completions endpoint
    Openai,
}

impl ProviderKind {
    fn key_vendor(self) -> &'static strings::KeyVendor {
        match self {
            ProviderKind::Gemini => &strings::GEMINI_KEYS,
            ProviderKind::Openai => &strings::OPENAI_KEYS,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tickerlens")]
#[command(about = "Stock indicator dashboard with optional AI commentary", long_about = None)]
struct Args {
    /// Secrets file with KEY="value" lines
    #[arg(long, default_value = "secrets.env")]
    secrets: PathBuf,

    /// Ticker pre-filled in the sidebar
    #[arg(long)]
    ticker: Option<String>,

    /// UI and report language (zh-TW or en)
    #[arg(long, default_value = "zh-TW")]
    language: String,

    /// Location of the CJK chart font
    #[arg(long)]
    font_path: Option<PathBuf>,

    /// Where to download the font from when it is missing
    #[arg(long)]
    font_url: Option<String>,

    /// Do not download the font; refuse to analyze until it is present
    #[arg(long)]
    require_font: bool,

    /// Generative-text provider for the AI report
    #[arg(long, value_enum, default_value_t = ProviderKind::Gemini)]
    provider: ProviderKind,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long)]
    api_base: Option<String>,
}

fn build_config(args: &Args) -> anyhow::Result<DashboardConfig> {
    let mut builder = DashboardConfig::builder().language(Language::from_code(&args.language));

    if let Some(ticker) = &args.ticker {
        builder = builder.default_ticker(ticker);
    }
    if let Some(path) = &args.font_path {
        builder = builder.font_path(path);
    }

    let url = args
        .font_url
        .clone()
        .unwrap_or_else(|| DEFAULT_FONT_URL.to_string());
    builder = builder.font_policy(if args.require_font {
        FontPolicy::RequireLocal {
            hint: format!("download it from {url}"),
        }
    } else {
        FontPolicy::Download { url }
    });

    if args.provider == ProviderKind::Openai {
        builder = builder.api_key_name("OPENAI_API_KEY").model("gpt-4o-mini");
    }
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }

    Ok(builder.build()?)
}

/// Commentary stage, or `None` when no API key is available
fn build_commentator(
    args: &Args,
    config: &DashboardConfig,
    secrets: &SecretStore,
) -> anyhow::Result<Option<Commentator>> {
    let timeout = config.request_timeout.as_secs();
    let key = config.api_key(secrets);

    let provider: Arc<dyn LLMProvider> = match args.provider {
        ProviderKind::Gemini => {
            let Some(key) = key else {
                return Ok(None);
            };
            let mut provider_config = GeminiConfig::new(key).with_timeout(timeout);
            if let Some(base) = &args.api_base {
                provider_config = provider_config.with_api_base(base);
            }
            Arc::new(GeminiProvider::with_config(provider_config)?)
        }
        ProviderKind::Openai => {
            // Local OpenAI-compatible servers usually run without a key
            let key = match (key, &args.api_base) {
                (Some(key), _) => key,
                (None, Some(_)) => "not-needed".to_string(),
                (None, None) => return Ok(None),
            };
            let mut provider_config = OpenAIConfig::new(key).with_timeout(timeout);
            if let Some(base) = &args.api_base {
                provider_config = provider_config.with_api_base(base);
            }
            Arc::new(OpenAIProvider::with_config(provider_config)?)
        }
    };

    info!("AI commentary enabled via {}", provider.name());
    Ok(Some(Commentator::new(
        provider,
        config.commentary.clone(),
        config.language.clone(),
    )?))
}

/// Warning and setup steps for the selected provider when no key is found
fn build_key_notice(args: &Args, config: &DashboardConfig) -> KeyNotice {
    let vendor = args.provider.key_vendor();
    KeyNotice {
        warning: strings::missing_key_warning(&config.language, vendor),
        help: strings::missing_key_help(
            &config.language,
            &args.secrets.display().to_string(),
            &config.commentary.api_key_name,
            vendor,
        ),
    }
}

fn main() -> anyhow::Result<()> {
    lens_utils::init_tracing();

    let args = Args::parse();
    let config = build_config(&args)?;
    let secrets = SecretStore::from_file(&args.secrets)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;

    let provisioner = FontProvisioner::new(config.font.clone(), config.request_timeout)?;
    let provision = runtime.block_on(provisioner.provision(&config.language));
    provision.banners.iter().for_each(app::log_banner);

    let commentator = build_commentator(&args, &config, &secrets)?;
    let key_notice = commentator.is_none().then(|| build_key_notice(&args, &config));

    let mut pipeline = AnalysisPipeline::new(
        Arc::new(YahooFinanceClient::new()),
        config.language.clone(),
    );
    if let Some(commentator) = commentator {
        pipeline = pipeline.with_commentator(commentator);
    }

    let dashboard = DashboardApp::new(Startup {
        runtime,
        pipeline,
        theme: provision.theme,
        notices: provision.banners,
        font_halted: provision.halted,
        key_notice,
        form: QueryForm::new(
            config.default_ticker.clone(),
            config.default_start,
            Local::now().date_naive(),
        ),
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };

    info!("Starting dashboard");
    eframe::run_native(
        strings::window_title(&config.language),
        native_options,
        Box::new(move |cc| {
            dashboard.setup(&cc.egui_ctx);
            Box::new(dashboard)
        }),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
