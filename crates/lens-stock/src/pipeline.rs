//! The analysis run behind the dashboard's button
//!
//! Stages run strictly in order: fetch, indicators, charts, then commentary if
//! a [`Commentator`] is attached. A failing stage turns into an error banner
//! and ends the run; a failing commentary stage keeps everything produced
//! before it.

use crate::acquisition::DataAcquirer;
use crate::api::BarProvider;
use crate::charts::ChartSet;
use crate::commentary::Commentator;
use crate::error::{InputError, StockError};
use crate::indicators::calculate_technical_indicators;
use crate::status::Banner;
use crate::table::PriceTable;
use chrono::NaiveDate;
use lens_prompt::Language;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisQuery {
    /// Free-form ticker text; only its first token is used
    pub ticker: String,
    pub start: NaiveDate,
    /// Inclusive
    pub end: NaiveDate,
}

impl AnalysisQuery {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Charts were produced; the report may still be missing
    Completed,
    /// A stage before charting failed
    Aborted,
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub symbol: Option<String>,
    pub banners: Vec<Banner>,
    pub table: Option<PriceTable>,
    pub charts: Option<ChartSet>,
    pub report: Option<String>,
    pub outcome: RunOutcome,
}

impl AnalysisRun {
    fn aborted(symbol: Option<String>, banners: Vec<Banner>) -> Self {
        Self {
            symbol,
            banners,
            table: None,
            charts: None,
            report: None,
            outcome: RunOutcome::Aborted,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn errors(&self) -> impl Iterator<Item = &Banner> {
        self.banners.iter().filter(|b| b.is_error())
    }
}

/// Message shown to the user for `err`
pub fn describe_error(err: &StockError, language: &Language) -> String {
    let zh = matches!(language, Language::TraditionalChinese);
    match err {
        StockError::InvalidInput(InputError::EmptyTicker) => language
            .pick("Please enter a valid ticker symbol.", "請輸入有效的股票代碼。")
            .to_string(),
        StockError::InvalidInput(InputError::ReversedRange { .. }) => language
            .pick(
                "The end date must not be earlier than the start date.",
                "結束日期不可早於開始日期。",
            )
            .to_string(),
        StockError::InvalidInput(InputError::DateOutOfRange(date)) if zh => {
            format!("日期超出範圍：{date}")
        }
        StockError::InvalidInput(InputError::DateOutOfRange(date)) => {
            format!("Date out of range: {date}")
        }
        StockError::NoData { .. } => language
            .pick(
                "Could not fetch stock data. Check the ticker symbol or choose a different date range.",
                "無法獲取股票數據，請檢查股票代碼是否正確或更換日期範圍。",
            )
            .to_string(),
        StockError::YahooFinanceError(_) | StockError::NetworkError(_) if zh => {
            format!("獲取數據失敗：{err}")
        }
        StockError::YahooFinanceError(_) | StockError::NetworkError(_) => {
            format!("Failed to fetch data: {err}")
        }
        StockError::MissingColumn(_) | StockError::TableError(_) | StockError::IndicatorError(_)
            if zh =>
        {
            format!("計算技術指標失敗：{err}")
        }
        StockError::MissingColumn(_) | StockError::TableError(_) | StockError::IndicatorError(_) => {
            format!("Indicator calculation failed: {err}")
        }
        _ if err.is_commentary() && zh => format!("AI 分析失敗：{err}"),
        _ if err.is_commentary() => format!("AI analysis failed: {err}"),
        _ => err.to_string(),
    }
}

/// Fetch, compute, chart and optionally comment on one ticker
pub struct AnalysisPipeline {
    acquirer: DataAcquirer,
    commentator: Option<Commentator>,
    language: Language,
}

impl AnalysisPipeline {
    /// Pipeline without commentary
    pub fn new(provider: Arc<dyn BarProvider>, language: Language) -> Self {
        Self {
            acquirer: DataAcquirer::new(provider),
            commentator: None,
            language,
        }
    }

    /// Enable the commentary stage
    pub fn with_commentator(mut self, commentator: Commentator) -> Self {
        self.commentator = Some(commentator);
        self
    }

    pub fn commentary_enabled(&self) -> bool {
        self.commentator.is_some()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Run every stage for `query`
    ///
    /// Never fails: problems are reported as banners on the returned run.
    #[instrument(skip(self), fields(ticker = %query.ticker))]
    pub async fn run(&self, query: &AnalysisQuery) -> AnalysisRun {
        let mut banners = Vec::new();

        let (symbol, mut table) = match self
            .acquirer
            .acquire(&query.ticker, query.start, query.end, &self.language, &mut banners)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Data acquisition failed: {}", e);
                banners.push(Banner::error(describe_error(&e, &self.language)));
                return AnalysisRun::aborted(None, banners);
            }
        };

        if let Err(e) = calculate_technical_indicators(&mut table) {
            warn!("Indicator computation failed for {}: {}", symbol, e);
            banners.push(Banner::error(describe_error(&e, &self.language)));
            return AnalysisRun::aborted(Some(symbol), banners);
        }

        let charts = ChartSet::from_table(&table, &symbol, &self.language);

        let report = match &self.commentator {
            Some(commentator) => {
                banners.push(Banner::info(self.language.pick(
                    "🤖 AI is analyzing the data, please wait...",
                    "🤖 AI 正在分析數據，請稍候...",
                )));
                match commentator.generate(&table, &symbol).await {
                    Ok(text) => {
                        banners.push(Banner::success(
                            self.language.pick("AI analysis complete!", "AI 分析完成！"),
                        ));
                        Some(text)
                    }
                    Err(e) => {
                        warn!("Commentary failed for {}: {}", symbol, e);
                        banners.push(Banner::error(describe_error(&e, &self.language)));
                        None
                    }
                }
            }
            None => None,
        };

        info!(
            "Analysis of {} finished: {} rows, report: {}",
            symbol,
            table.len(),
            report.is_some()
        );

        AnalysisRun {
            symbol: Some(symbol),
            banners,
            table: Some(table),
            charts: Some(charts),
            report,
            outcome: RunOutcome::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBarProvider;
    use crate::config::CommentarySettings;
    use crate::indicators::{MACD_COLUMN, RSI_COLUMN};
    use crate::status::BannerLevel;
    use crate::table::{CLOSE, ColumnHeader, HIGH, LOW, OPEN, RawTable, VOLUME};
    use async_trait::async_trait;
    use chrono::{Datelike, Days, Weekday};
    use lens_llm::{
        CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason,
        TokenUsage,
    };

    struct MockProvider {
        fail: bool,
    }

    #[async_trait]
    impl LLMProvider for MockProvider {
        async fn complete(&self, _request: CompletionRequest) -> lens_llm::Result<CompletionResponse> {
            if self.fail {
                return Err(LLMError::AuthenticationFailed);
            }
            Ok(CompletionResponse {
                message: Message::assistant("## 2330.TW\n趨勢偏多"),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `rows` weekdays from 2024-01-02 with steadily accelerating closes
    fn rising_bars(rows: usize) -> RawTable {
        let mut dates = Vec::with_capacity(rows);
        let mut day = date(2024, 1, 2);
        while dates.len() < rows {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(day);
            }
            day = day.checked_add_days(Days::new(1)).unwrap();
        }

        let close: Vec<Option<f64>> = (0..rows)
            .map(|i| {
                let i = i as f64;
                Some(580.0 + 0.5 * i + 0.02 * i * i)
            })
            .collect();
        let shifted = |delta: f64| -> Vec<Option<f64>> {
            close.iter().map(|c| c.map(|v| v + delta)).collect()
        };

        RawTable::new(dates)
            .with_column(ColumnHeader::multi([OPEN, "2330.TW"]), shifted(-1.0))
            .unwrap()
            .with_column(ColumnHeader::multi([HIGH, "2330.TW"]), shifted(2.0))
            .unwrap()
            .with_column(ColumnHeader::multi([LOW, "2330.TW"]), shifted(-2.0))
            .unwrap()
            .with_column(ColumnHeader::multi([CLOSE, "2330.TW"]), close.clone())
            .unwrap()
            .with_column(ColumnHeader::multi([VOLUME, "2330.TW"]), vec![Some(2.5e7); rows])
            .unwrap()
    }

    fn provider_with(raw: RawTable) -> Arc<MockBarProvider> {
        let mut mock = MockBarProvider::new();
        mock.expect_name().return_const("Yahoo Finance");
        mock.expect_daily_bars()
            .withf(|symbol, _, _| symbol.to_string() == "2330.TW")
            .times(1)
            .returning(move |_, _, _| Ok(raw.clone()));
        Arc::new(mock)
    }

    fn query() -> AnalysisQuery {
        AnalysisQuery::new("2330.TW", date(2024, 1, 1), date(2024, 6, 30))
    }

    fn commentator(fail: bool) -> Commentator {
        Commentator::new(
            Arc::new(MockProvider { fail }),
            CommentarySettings::default(),
            Language::English,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_without_api_key() {
        let pipeline = AnalysisPipeline::new(provider_with(rising_bars(120)), Language::English);
        assert!(!pipeline.commentary_enabled());

        let run = pipeline.run(&query()).await;
        assert!(run.is_completed());
        assert_eq!(run.symbol.as_deref(), Some("2330.TW"));

        let table = run.table.as_ref().unwrap();
        assert_eq!(table.len(), 120);

        let rsi = table.column(RSI_COLUMN).unwrap();
        for value in rsi[110..].iter() {
            assert!(value.unwrap() > 99.0);
        }

        let macd = table.column(MACD_COLUMN).unwrap();
        let tail: Vec<f64> = macd[100..].iter().map(|v| v.unwrap()).collect();
        assert!(tail.iter().all(|v| *v > 0.0));
        assert!(tail.windows(2).all(|w| w[1] > w[0]));

        let charts = run.charts.as_ref().unwrap();
        assert!(charts.charts().iter().all(|c| !c.is_blank()));

        assert!(run.report.is_none());
        assert_eq!(run.errors().count(), 0);
        assert!(run.banners.iter().all(|b| !b.text.contains("AI")));
        let levels: Vec<BannerLevel> = run.banners.iter().map(|b| b.level).collect();
        assert_eq!(levels, vec![BannerLevel::Info, BannerLevel::Success]);
    }

    #[tokio::test]
    async fn test_commentary_failure_keeps_charts() {
        let pipeline = AnalysisPipeline::new(provider_with(rising_bars(120)), Language::English)
            .with_commentator(commentator(true));

        let run = pipeline.run(&query()).await;
        assert!(run.is_completed());
        assert!(run.charts.is_some());
        assert!(run.report.is_none());

        let errors: Vec<&Banner> = run.errors().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].text.starts_with("AI analysis failed"));
        assert!(errors[0].text.contains("invalid API key"));
    }

    #[tokio::test]
    async fn test_commentary_report_is_verbatim() {
        let pipeline = AnalysisPipeline::new(provider_with(rising_bars(60)), Language::English)
            .with_commentator(commentator(false));

        let run = pipeline.run(&query()).await;
        assert_eq!(run.report.as_deref(), Some("## 2330.TW\n趨勢偏多"));
        assert_eq!(run.banners.last().unwrap().level, BannerLevel::Success);
        assert_eq!(run.errors().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_ticker_aborts_without_fetch() {
        let pipeline =
            AnalysisPipeline::new(Arc::new(MockBarProvider::new()), Language::TraditionalChinese)
                .with_commentator(commentator(false));

        let run = pipeline
            .run(&AnalysisQuery::new("  ", date(2024, 1, 1), date(2024, 6, 30)))
            .await;
        assert_eq!(run.outcome, RunOutcome::Aborted);
        assert!(run.charts.is_none());
        assert_eq!(run.banners, vec![Banner::error("請輸入有效的股票代碼。")]);
    }

    #[tokio::test]
    async fn test_no_data_aborts() {
        let pipeline = AnalysisPipeline::new(provider_with(RawTable::default()), Language::English)
            .with_commentator(commentator(false));

        let run = pipeline.run(&query()).await;
        assert_eq!(run.outcome, RunOutcome::Aborted);
        assert!(run.report.is_none());
        let last = run.banners.last().unwrap();
        assert!(last.is_error());
        assert!(last.text.starts_with("Could not fetch stock data"));
    }

    #[test]
    fn test_describe_error_languages() {
        let err = StockError::InvalidInput(InputError::ReversedRange {
            start: date(2024, 6, 30),
            end: date(2024, 1, 1),
        });
        assert_eq!(
            describe_error(&err, &Language::TraditionalChinese),
            "結束日期不可早於開始日期。"
        );

        let err = StockError::IndicatorError("bad period".to_string());
        assert!(describe_error(&err, &Language::English).starts_with("Indicator calculation failed"));

        let err = StockError::Prompt(lens_prompt::PromptError::RenderError {
            name: "commentary".to_string(),
            detail: "undefined value".to_string(),
        });
        assert!(describe_error(&err, &Language::TraditionalChinese).starts_with("AI 分析失敗"));
    }
}
