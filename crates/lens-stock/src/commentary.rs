//! AI commentary on the latest indicator readings
//!
//! A fixed prompt embeds the latest row and the table's closing-price range.
//! The model's answer is display text only: it is returned verbatim and never
//! parsed.

use crate::config::CommentarySettings;
use crate::error::Result;
use crate::indicators::{MACD_COLUMN, MACD_SIGNAL_COLUMN, RSI_COLUMN};
use crate::table::{CLOSE, PriceTable, VOLUME};
use lens_llm::{CompletionRequest, LLMProvider, Message, StopReason};
use lens_prompt::{JinjaTemplate, Language, PromptError, PromptTemplate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Placeholder for values the table does not define
pub const NOT_AVAILABLE: &str = "N/A";

const TEMPLATE_NAME: &str = "stock_commentary";

const PROMPT_ZH: &str = r"您是一位專業的台股分析師。請根據以下股票數據和技術指標，為股票 {{ ticker }} 提供一份專業、條理分明、且客觀的分析報告。

**分析重點:**
1.  **基本趨勢**: 根據收盤價和成交量，判斷目前的市場趨勢（多頭、空頭、盤整）。
2.  **技術指標解讀**:
    *   **RSI**: 解釋目前的 RSI 值所代表的市場情緒（超買、超賣、中性），並評估其對未來股價的可能影響。
    *   **MACD**: 解釋 MACD 線、信號線和柱狀圖的關係（黃金交叉、死亡交叉），並判斷動能的增強或減弱。
3.  **綜合評論與展望**: 結合以上分析，提供一個簡潔的綜合評論，並對短期內的股價走勢做出合理展望。請以中立、客觀的角度進行分析，並避免提供直接的買賣建議。

**數據摘要:**
- **最新收盤價**: {{ latest_close }}
- **最新成交量**: {{ latest_volume }}
- **期間最高收盤價**: {{ period_high }}
- **期間最低收盤價**: {{ period_low }}
- **最新 RSI (14天)**: {{ latest_rsi }}
- **最新 MACD**: {{ latest_macd }}
- **MACD 信號線**: {{ latest_signal }}

請以 Markdown 格式輸出您的分析報告，包含標題和分點說明。
";

const PROMPT_EN: &str = r"You are a professional equity analyst. Based on the stock data and technical indicators below, write a professional, well-structured and objective analysis report for {{ ticker }}.

**Focus areas:**
1.  **Underlying trend**: From the closing price and volume, judge the current market trend (bullish, bearish or range-bound).
2.  **Indicator reading**:
    *   **RSI**: Explain the market sentiment the current RSI value reflects (overbought, oversold or neutral) and its possible effect on the price.
    *   **MACD**: Explain how the MACD line, signal line and histogram relate (golden cross, death cross) and whether momentum is strengthening or weakening.
3.  **Overall view and outlook**: Combine the above into a concise overall comment with a reasonable short-term outlook. Stay neutral and objective, and do not give direct buy or sell recommendations.

**Data summary:**
- **Latest close**: {{ latest_close }}
- **Latest volume**: {{ latest_volume }}
- **Period high (close)**: {{ period_high }}
- **Period low (close)**: {{ period_low }}
- **Latest RSI (14)**: {{ latest_rsi }}
- **Latest MACD**: {{ latest_macd }}
- **MACD signal line**: {{ latest_signal }}

Write the report in Markdown with a title and bullet points.
";

/// Format `value` with `decimals` places, or [`NOT_AVAILABLE`]
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Figures embedded in the prompt, already formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    pub ticker: String,
    pub latest_close: String,
    pub latest_volume: String,
    pub period_high: String,
    pub period_low: String,
    pub latest_rsi: String,
    pub latest_macd: String,
    pub latest_signal: String,
}

impl DataSummary {
    pub fn from_table(table: &PriceTable, ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            latest_close: format_value(table.latest(CLOSE), 2),
            latest_volume: format_value(table.latest(VOLUME), 0),
            period_high: format_value(table.max(CLOSE), 2),
            period_low: format_value(table.min(CLOSE), 2),
            latest_rsi: format_value(table.latest(RSI_COLUMN), 2),
            latest_macd: format_value(table.latest(MACD_COLUMN), 2),
            latest_signal: format_value(table.latest(MACD_SIGNAL_COLUMN), 2),
        }
    }
}

/// The commentary prompt in English and Traditional Chinese
pub fn commentary_template() -> Result<JinjaTemplate> {
    Ok(JinjaTemplate::bilingual(TEMPLATE_NAME, PROMPT_EN, PROMPT_ZH)?)
}

/// Requests a written analysis from a generative-text provider
pub struct Commentator {
    provider: Arc<dyn LLMProvider>,
    settings: CommentarySettings,
    language: Language,
    template: JinjaTemplate,
}

impl Commentator {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        settings: CommentarySettings,
        language: Language,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            settings,
            language,
            template: commentary_template()?,
        })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Render the prompt for `table`
    pub fn build_prompt(&self, table: &PriceTable, ticker: &str) -> Result<String> {
        let vars = serde_json::to_value(DataSummary::from_table(table, ticker)).map_err(|e| {
            PromptError::RenderError {
                name: TEMPLATE_NAME.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(self.template.render_with_fallback(&self.language, &vars)?)
    }

    /// Ask the provider for a report on `table`
    #[instrument(skip(self, table), fields(provider = %self.provider.name(), model = %self.settings.model))]
    pub async fn generate(&self, table: &PriceTable, ticker: &str) -> Result<String> {
        let prompt = self.build_prompt(table, ticker)?;

        let mut request = CompletionRequest::builder(&self.settings.model)
            .add_message(Message::user(prompt))
            .max_tokens(self.settings.max_output_tokens);
        if let Some(temperature) = self.settings.temperature {
            request = request.temperature(temperature);
        }

        let response = self.provider.complete(request.build()).await?;
        if response.stop_reason == StopReason::MaxTokens {
            warn!("Commentary was cut off at {} tokens", self.settings.max_output_tokens);
        }
        info!("Commentary received ({} tokens)", response.usage.total());

        Ok(response.text().to_string())
    }
}
