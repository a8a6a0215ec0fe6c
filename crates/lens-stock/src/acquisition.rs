//! Data acquisition: ticker text and a date range in, normalized price table out

use crate::api::BarProvider;
use crate::error::{InputError, Result, StockError};
use crate::status::Banner;
use crate::table::PriceTable;
use chrono::NaiveDate;
use lens_prompt::Language;
use std::sync::Arc;
use tracing::{info, instrument};

/// Symbol from free-form ticker text: the first whitespace-delimited token
///
/// # Examples
///
/// ```
/// use lens_stock::acquisition::extract_symbol;
///
/// assert_eq!(extract_symbol(" 2330.TW ").unwrap(), "2330.TW");
/// assert_eq!(extract_symbol("2330.TW extra").unwrap(), "2330.TW");
/// assert!(extract_symbol("   ").is_err());
/// ```
pub fn extract_symbol(raw: &str) -> Result<String> {
    raw.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(StockError::InvalidInput(InputError::EmptyTicker))
}

/// Reject ranges whose end precedes their start
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(InputError::ReversedRange { start, end }.into());
    }
    Ok(())
}

/// Fetches and normalizes daily bars through a [`BarProvider`]
#[derive(Clone)]
pub struct DataAcquirer {
    provider: Arc<dyn BarProvider>,
}

impl DataAcquirer {
    pub fn new(provider: Arc<dyn BarProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the symbol, fetch `[start, end]` and normalize the result
    ///
    /// Input errors are raised before the provider is contacted. Progress is
    /// reported through `banners`; failures are returned to the caller.
    #[instrument(skip(self, banners))]
    pub async fn acquire(
        &self,
        raw_ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        language: &Language,
        banners: &mut Vec<Banner>,
    ) -> Result<(String, PriceTable)> {
        let symbol = extract_symbol(raw_ticker)?;
        validate_range(start, end)?;

        banners.push(Banner::info(match language {
            Language::TraditionalChinese => {
                format!("正在從 {} 獲取 {symbol} 的數據...", self.provider.name())
            }
            _ => format!("Fetching {symbol} from {}...", self.provider.name()),
        }));

        let raw = self.provider.daily_bars(&symbol, start, end).await?;
        if raw.is_empty() {
            return Err(StockError::NoData {
                symbol,
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let table = raw.normalize(&symbol);
        info!("Fetched {} rows for {}", table.len(), symbol);
        banners.push(Banner::success(
            language.pick("Data fetched successfully!", "數據獲取成功！"),
        ));

        Ok((symbol, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBarProvider;
    use crate::status::BannerLevel;
    use crate::table::{ColumnHeader, RawTable};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_extract_symbol() {
        assert_eq!(extract_symbol("2330.TW").unwrap(), "2330.TW");
        assert_eq!(extract_symbol(" 2330.TW ").unwrap(), "2330.TW");
        assert_eq!(extract_symbol("2330.TW extra").unwrap(), "2330.TW");
        assert_eq!(extract_symbol("\t0050.TW\n").unwrap(), "0050.TW");
        assert!(matches!(
            extract_symbol(""),
            Err(StockError::InvalidInput(InputError::EmptyTicker))
        ));
        assert!(matches!(
            extract_symbol(" \t "),
            Err(StockError::InvalidInput(InputError::EmptyTicker))
        ));
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(date(1, 1), date(1, 1)).is_ok());
        assert!(validate_range(date(1, 1), date(6, 30)).is_ok());
        assert!(validate_range(date(6, 30), date(1, 1)).is_err());
    }

    #[tokio::test]
    async fn test_empty_ticker_makes_no_remote_call() {
        // No expectations: any provider call panics
        let acquirer = DataAcquirer::new(Arc::new(MockBarProvider::new()));
        let mut banners = Vec::new();

        let result = acquirer
            .acquire("   ", date(1, 1), date(6, 30), &Language::English, &mut banners)
            .await;

        assert!(matches!(result, Err(StockError::InvalidInput(_))));
        assert!(banners.is_empty());
    }

    #[tokio::test]
    async fn test_reversed_range_makes_no_remote_call() {
        let acquirer = DataAcquirer::new(Arc::new(MockBarProvider::new()));
        let mut banners = Vec::new();

        let result = acquirer
            .acquire("2330.TW", date(6, 30), date(1, 1), &Language::English, &mut banners)
            .await;

        assert!(matches!(result, Err(StockError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_zero_rows_is_no_data() {
        let mut mock = MockBarProvider::new();
        mock.expect_name().return_const("Mock Feed");
        mock.expect_daily_bars()
            .withf(|symbol, _, _| symbol.to_string() == "ZZZZ.TW")
            .times(1)
            .returning(|_, _, _| Ok(RawTable::default()));

        let acquirer = DataAcquirer::new(Arc::new(mock));
        let mut banners = Vec::new();
        let result = acquirer
            .acquire("ZZZZ.TW", date(1, 1), date(6, 30), &Language::English, &mut banners)
            .await;

        assert!(matches!(result, Err(StockError::NoData { .. })));
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].level, BannerLevel::Info);
        assert!(banners[0].text.contains("Mock Feed"));
    }

    #[tokio::test]
    async fn test_multi_level_columns_are_flattened() {
        let raw = RawTable::new(vec![date(1, 2), date(1, 3)])
            .with_column(ColumnHeader::multi(["2330.TW", "Close"]), vec![Some(590.0), Some(593.0)])
            .unwrap()
            .with_column(ColumnHeader::multi(["2330.TW", "Volume"]), vec![Some(1e6), Some(2e6)])
            .unwrap()
            .with_column(ColumnHeader::multi(["2330.TW", "Close"]), vec![None, None])
            .unwrap();

        let mut mock = MockBarProvider::new();
        mock.expect_name().return_const("Mock Feed");
        mock.expect_daily_bars()
            .withf(|symbol, start, end| {
                symbol.to_string() == "2330.TW"
                    && *start == NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    && *end == NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
            })
            .times(1)
            .returning(move |_, _, _| Ok(raw.clone()));

        let acquirer = DataAcquirer::new(Arc::new(mock));
        let mut banners = Vec::new();
        let (symbol, table) = acquirer
            .acquire(" 2330.TW  TSMC", date(1, 1), date(1, 31), &Language::TraditionalChinese, &mut banners)
            .await
            .unwrap();

        assert_eq!(symbol, "2330.TW");
        assert_eq!(table.column_names(), vec!["Close", "Volume"]);
        assert_eq!(table.column("Close").unwrap(), &[Some(590.0), Some(593.0)]);
        assert_eq!(banners.len(), 2);
        assert_eq!(banners[1].level, BannerLevel::Success);
        assert_eq!(banners[1].text, "數據獲取成功！");
    }

    #[tokio::test]
    async fn test_provider_error_is_returned() {
        let mut mock = MockBarProvider::new();
        mock.expect_name().return_const("Mock Feed");
        mock.expect_daily_bars()
            .returning(|_, _, _| Err(StockError::YahooFinanceError("HTTP 503".to_string())));

        let acquirer = DataAcquirer::new(Arc::new(mock));
        let mut banners = Vec::new();
        let result = acquirer
            .acquire("AAPL", date(1, 1), date(1, 31), &Language::English, &mut banners)
            .await;

        assert!(matches!(result, Err(StockError::YahooFinanceError(_))));
    }
}
