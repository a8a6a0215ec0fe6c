//! Fixed UI text in both supported languages

use lens_prompt::Language;

pub fn window_title(lang: &Language) -> &'static str {
    lang.pick("📈 AI Stock Analysis Assistant", "📈 AI 股票分析助理")
}

pub fn sidebar_header(lang: &Language) -> &'static str {
    lang.pick("Analysis settings", "分析設定")
}

pub fn ticker_label(lang: &Language) -> &'static str {
    lang.pick(
        "Ticker symbol (e.g. 2330.TW)",
        "請輸入台股代碼 (例如: 2330.TW)",
    )
}

pub fn start_label(lang: &Language) -> &'static str {
    lang.pick("Start date", "開始日期")
}

pub fn end_label(lang: &Language) -> &'static str {
    lang.pick("End date", "結束日期")
}

pub fn run_button(lang: &Language) -> &'static str {
    lang.pick("Run analysis", "開始分析")
}

pub fn running(lang: &Language) -> &'static str {
    lang.pick("Analyzing...", "分析中...")
}

pub fn empty_ticker(lang: &Language) -> &'static str {
    lang.pick("Please enter a ticker symbol.", "請輸入股票代碼。")
}

pub fn disclaimer(lang: &Language) -> &'static str {
    lang.pick(
        "A sample project that uses AI for stock analysis. All analysis is for reference only and is not investment advice.",
        "這是一個使用 AI 進行股票分析的範例專案。所有分析僅供參考，不構成任何投資建議。",
    )
}

pub fn font_halted(lang: &Language) -> &'static str {
    lang.pick(
        "Analysis is disabled until the Chinese font is available.",
        "在中文字體就緒前無法進行分析。",
    )
}

/// Where a provider's API keys are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyVendor {
    /// Provider name shown in the warning
    pub name: &'static str,
    /// Console that issues keys
    pub console: &'static str,
    pub url: &'static str,
    pub free_tier: bool,
}

pub const GEMINI_KEYS: KeyVendor = KeyVendor {
    name: "Gemini",
    console: "Google AI Studio",
    url: "https://aistudio.google.com/app/apikey",
    free_tier: true,
};

pub const OPENAI_KEYS: KeyVendor = KeyVendor {
    name: "OpenAI",
    console: "OpenAI Platform",
    url: "https://platform.openai.com/api-keys",
    free_tier: false,
};

pub fn missing_key_warning(lang: &Language, vendor: &KeyVendor) -> String {
    let name = vendor.name;
    match lang {
        Language::TraditionalChinese => format!("您尚未設定 {name} API 金鑰，AI 分析功能將被停用。"),
        _ => format!("No {name} API key is configured; AI analysis is disabled."),
    }
}

/// Setup steps shown under the missing-key warning
pub fn missing_key_help(
    lang: &Language,
    secrets_file: &str,
    key_name: &str,
    vendor: &KeyVendor,
) -> String {
    let KeyVendor {
        console,
        url,
        free_tier,
        ..
    } = *vendor;
    match lang {
        Language::TraditionalChinese => {
            let source = if free_tier {
                format!("{console} ({url}) 的免費方案")
            } else {
                format!("{console} ({url})")
            };
            format!(
                "若要啟用 AI 分析，請設定您的 API 金鑰。有兩種方式：\n\
                 1. （建議）在專案中建立 `{secrets_file}` 檔案，並加入：{key_name}=\"您的API金鑰\"\n\
                 2. 設定名為 `{key_name}` 的環境變數。\n\
                 您可以從 {source} 獲取金鑰。"
            )
        }
        _ => {
            let source = if free_tier {
                format!("A free key is available from {console} ({url}).")
            } else {
                format!("Keys are issued by {console} ({url}).")
            };
            format!(
                "To enable AI analysis, configure your API key in one of two ways:\n\
                 1. (Recommended) Create `{secrets_file}` containing: {key_name}=\"your-api-key\"\n\
                 2. Set an environment variable named `{key_name}`.\n\
                 {source}"
            )
        }
    }
}

pub fn charts_heading(lang: &Language, ticker: &str) -> String {
    match lang {
        Language::TraditionalChinese => format!("{ticker} 技術分析圖表"),
        _ => format!("{ticker} technical charts"),
    }
}

pub fn report_heading(lang: &Language) -> &'static str {
    lang.pick("🤖 AI Investment Analysis Report", "🤖 AI 投資分析報告")
}
