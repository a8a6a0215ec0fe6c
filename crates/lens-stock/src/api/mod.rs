//! Market data providers

pub mod yahoo;

use crate::error::Result;
use crate::table::RawTable;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use yahoo::YahooFinanceClient;

/// Source of daily OHLCV bars
///
/// `start` and `end` are both inclusive calendar dates. An unknown symbol or
/// an empty range yields an empty table rather than an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// Fetch daily bars for `symbol` over `[start, end]`
    async fn daily_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawTable>;

    /// Name shown to the user while fetching
    fn name(&self) -> &'static str;
}
