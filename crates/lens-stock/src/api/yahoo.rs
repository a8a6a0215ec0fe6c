//! Yahoo Finance API client

use super::BarProvider;
use crate::error::{InputError, Result, StockError};
use crate::table::{CLOSE, ColumnHeader, HIGH, LOW, OPEN, RawTable, VOLUME};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

/// Yahoo Finance API client
#[derive(Debug, Default)]
pub struct YahooFinanceClient {}

/// One daily bar as reported by the feed
#[derive(Debug, Clone, Copy, PartialEq)]
struct DailyBar {
    /// Session open, seconds since the epoch (UTC)
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl BarProvider for YahooFinanceClient {
    #[instrument(skip(self))]
    async fn daily_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawTable> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        // The upper bound is exclusive on the wire; ask for the following midnight
        let upper = end
            .checked_add_days(Days::new(1))
            .ok_or(StockError::InvalidInput(InputError::DateOutOfRange(end)))?;
        let start_odt = to_offset_date_time(start)?;
        let end_odt = to_offset_date_time(upper)?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                debug!("No quotes in response for {}: {}", symbol, e);
                Vec::new()
            }
        };

        // Sessions are dated in exchange-local time
        let gmtoffset = response
            .metadata()
            .map(|meta| i64::from(meta.gmtoffset))
            .unwrap_or_default();

        let bars: Vec<DailyBar> = quotes
            .iter()
            .map(|q| DailyBar {
                timestamp: q.timestamp as i64,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume as f64,
            })
            .collect();

        debug!(
            "Received {} bars for {} (gmtoffset {}s)",
            bars.len(),
            symbol,
            gmtoffset
        );
        bars_to_table(&bars, gmtoffset, start, end)
    }

    fn name(&self) -> &'static str {
        "Yahoo Finance"
    }
}

fn to_offset_date_time(date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|_| StockError::InvalidInput(InputError::DateOutOfRange(date)))
}

/// Trading date of a session that opened at `timestamp`, given the exchange's UTC offset
fn session_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    let local = timestamp.checked_add(gmtoffset)?;
    DateTime::from_timestamp(local, 0).map(|dt| dt.date_naive())
}

/// Lay bars out column-wise, keeping only dates inside `[start, end]`
///
/// The feed reports NaN for sessions without trades; those become undefined cells.
fn bars_to_table(
    bars: &[DailyBar],
    gmtoffset: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RawTable> {
    let dated: Vec<(NaiveDate, &DailyBar)> = bars
        .iter()
        .filter_map(|bar| {
            let date = session_date(bar.timestamp, gmtoffset);
            if date.is_none() {
                warn!("Skipping quote with invalid timestamp {}", bar.timestamp);
            }
            date.map(|date| (date, bar))
        })
        .filter(|(date, _)| *date >= start && *date <= end)
        .collect();

    let column = |field: fn(&DailyBar) -> f64| -> Vec<Option<f64>> {
        dated
            .iter()
            .map(|(_, bar)| Some(field(bar)).filter(|v| v.is_finite()))
            .collect()
    };

    RawTable::new(dated.iter().map(|(date, _)| *date).collect())
        .with_column(ColumnHeader::single(OPEN), column(|b| b.open))?
        .with_column(ColumnHeader::single(HIGH), column(|b| b.high))?
        .with_column(ColumnHeader::single(LOW), column(|b| b.low))?
        .with_column(ColumnHeader::single(CLOSE), column(|b| b.close))?
        .with_column(ColumnHeader::single(VOLUME), column(|b| b.volume))
}
