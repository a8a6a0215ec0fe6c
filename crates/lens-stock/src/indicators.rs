//! Technical indicators appended to a [`PriceTable`]
//!
//! - **RSI(14)**: gains and losses are smoothed with Wilder's average: the
//!   simple mean of the first 14 price changes, then `alpha = 1/14`. The first
//!   14 rows have no value.
//! - **MACD(12,26,9)**: each EMA is seeded with the simple average of its first
//!   `n` inputs and continues with `alpha = 2/(n+1)`. The signal line is the EMA
//!   of the defined MACD values, so it starts 8 rows after the MACD line.
//!
//! The recurrences implement `ta`'s [`Next`], [`Reset`] and [`Period`] traits so
//! they compose like the crate's own indicators.

use crate::error::{Result, StockError};
use crate::table::{CLOSE, PriceTable};
use std::fmt;
use ta::indicators::SimpleMovingAverage;
use ta::{Next, Period, Reset};
use tracing::debug;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

pub const RSI_COLUMN: &str = "RSI_14";
pub const MACD_COLUMN: &str = "MACD_12_26_9";
pub const MACD_SIGNAL_COLUMN: &str = "MACDs_12_26_9";
pub const MACD_HIST_COLUMN: &str = "MACDh_12_26_9";

/// RSI level above which a market is considered overbought
pub const OVERBOUGHT: f64 = 70.0;
/// RSI level below which a market is considered oversold
pub const OVERSOLD: f64 = 30.0;

fn check_period(period: usize) -> Result<()> {
    if period == 0 {
        return Err(StockError::IndicatorError(
            "period must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Wilder's moving average: the simple average of the first `period` inputs,
/// then an EMA with `alpha = 1/period`
#[derive(Debug, Clone)]
pub struct WilderAverage {
    period: usize,
    alpha: f64,
    seed: SimpleMovingAverage,
    count: usize,
    value: f64,
}

impl WilderAverage {
    pub fn new(period: usize) -> Result<Self> {
        check_period(period)?;
        let seed = SimpleMovingAverage::new(period)
            .map_err(|e| StockError::IndicatorError(e.to_string()))?;
        Ok(Self {
            period,
            alpha: 1.0 / period as f64,
            seed,
            count: 0,
            value: 0.0,
        })
    }
}

impl Period for WilderAverage {
    fn period(&self) -> usize {
        self.period
    }
}

impl Next<f64> for WilderAverage {
    type Output = Option<f64>;

    fn next(&mut self, input: f64) -> Self::Output {
        self.count += 1;
        if self.count <= self.period {
            let average = self.seed.next(input);
            if self.count < self.period {
                return None;
            }
            self.value = average;
        } else {
            self.value += self.alpha * (input - self.value);
        }
        Some(self.value)
    }
}

impl Reset for WilderAverage {
    fn reset(&mut self) {
        self.seed.reset();
        self.count = 0;
        self.value = 0.0;
    }
}

/// Relative Strength Index over closing prices
#[derive(Debug, Clone)]
pub struct WilderRsi {
    previous: Option<f64>,
    gains: WilderAverage,
    losses: WilderAverage,
}

impl WilderRsi {
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            previous: None,
            gains: WilderAverage::new(period)?,
            losses: WilderAverage::new(period)?,
        })
    }
}

impl Period for WilderRsi {
    fn period(&self) -> usize {
        self.gains.period()
    }
}

impl Next<f64> for WilderRsi {
    type Output = Option<f64>;

    fn next(&mut self, close: f64) -> Self::Output {
        let previous = self.previous.replace(close)?;
        let change = close - previous;
        let gain = self.gains.next(change.max(0.0));
        let loss = self.losses.next((-change).max(0.0));

        match (gain, loss) {
            // A flat window has no defined strength
            (Some(gain), Some(loss)) if gain + loss > 0.0 => Some(100.0 * gain / (gain + loss)),
            _ => None,
        }
    }
}

impl Reset for WilderRsi {
    fn reset(&mut self) {
        self.previous = None;
        self.gains.reset();
        self.losses.reset();
    }
}

impl fmt::Display for WilderRsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSI({})", self.period())
    }
}

/// Exponential moving average seeded with the simple average of its first `period` inputs
#[derive(Debug, Clone)]
pub struct SeededEma {
    period: usize,
    k: f64,
    seed: SimpleMovingAverage,
    count: usize,
    value: f64,
}

impl SeededEma {
    pub fn new(period: usize) -> Result<Self> {
        check_period(period)?;
        let seed = SimpleMovingAverage::new(period)
            .map_err(|e| StockError::IndicatorError(e.to_string()))?;
        Ok(Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seed,
            count: 0,
            value: 0.0,
        })
    }
}

impl Period for SeededEma {
    fn period(&self) -> usize {
        self.period
    }
}

impl Next<f64> for SeededEma {
    type Output = Option<f64>;

    fn next(&mut self, input: f64) -> Self::Output {
        self.count += 1;
        if self.count <= self.period {
            let average = self.seed.next(input);
            if self.count < self.period {
                return None;
            }
            self.value = average;
        } else {
            self.value += self.k * (input - self.value);
        }
        Some(self.value)
    }
}

impl Reset for SeededEma {
    fn reset(&mut self) {
        self.seed.reset();
        self.count = 0;
        self.value = 0.0;
    }
}

impl fmt::Display for SeededEma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EMA({})", self.period)
    }
}

/// MACD line, signal line and histogram, aligned with the input rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdColumns {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// RSI of `closes`; undefined closes yield undefined rows and are skipped by the recurrence
pub fn rsi(closes: &[Option<f64>], period: usize) -> Result<Vec<Option<f64>>> {
    let mut indicator = WilderRsi::new(period)?;
    Ok(closes
        .iter()
        .map(|close| close.and_then(|c| indicator.next(c)))
        .collect())
}

/// MACD of `closes` with the given fast, slow and signal periods
pub fn macd(closes: &[Option<f64>], fast: usize, slow: usize, signal: usize) -> Result<MacdColumns> {
    if fast >= slow {
        return Err(StockError::IndicatorError(format!(
            "fast period {fast} must be shorter than slow period {slow}"
        )));
    }

    let mut fast_ema = SeededEma::new(fast)?;
    let mut slow_ema = SeededEma::new(slow)?;
    let mut signal_ema = SeededEma::new(signal)?;
    debug!("Computing MACD from {} and {}", fast_ema, slow_ema);

    let mut columns = MacdColumns::default();
    for close in closes {
        let line = close.and_then(|c| {
            let fast = fast_ema.next(c);
            let slow = slow_ema.next(c);
            fast.zip(slow).map(|(f, s)| f - s)
        });
        let signal_value = line.and_then(|m| signal_ema.next(m));
        let histogram = line.zip(signal_value).map(|(m, s)| m - s);

        columns.macd.push(line);
        columns.signal.push(signal_value);
        columns.histogram.push(histogram);
    }
    Ok(columns)
}

/// Append `RSI_14` computed from `Close`
pub fn append_rsi(table: &mut PriceTable) -> Result<()> {
    let values = rsi(table.require(CLOSE)?, RSI_PERIOD)?;
    table.set_column(RSI_COLUMN, values)
}

/// Append `MACD_12_26_9`, `MACDs_12_26_9` and `MACDh_12_26_9` computed from `Close`
///
/// Short tables still get the three columns, with every row undefined.
pub fn append_macd(table: &mut PriceTable) -> Result<()> {
    let columns = macd(table.require(CLOSE)?, MACD_FAST, MACD_SLOW, MACD_SIGNAL)?;
    table.set_column(MACD_COLUMN, columns.macd)?;
    table.set_column(MACD_SIGNAL_COLUMN, columns.signal)?;
    table.set_column(MACD_HIST_COLUMN, columns.histogram)
}

/// Append every indicator the dashboard charts
pub fn calculate_technical_indicators(table: &mut PriceTable) -> Result<()> {
    append_rsi(table)?;
    append_macd(table)?;
    debug!("Indicators appended: {:?}", table.column_names());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn table_from(closes: &[f64]) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..closes.len())
            .map(|i| start.checked_add_days(Days::new(i as u64)).unwrap())
            .collect();
        let mut table = PriceTable::new(dates);
        table
            .set_column(CLOSE, closes.iter().copied().map(Some).collect())
            .unwrap();
        table
    }

    fn zigzag(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_wilder_average_recurrence() {
        let mut avg = WilderAverage::new(2).unwrap();
        assert_eq!(avg.next(4.0), None);
        assert_eq!(avg.next(2.0), Some(3.0));
        assert_eq!(avg.next(5.0), Some(4.0));
        avg.reset();
        assert_eq!(avg.next(1.0), None);
    }

    #[test]
    fn test_wilder_average_seeds_with_mean() {
        let mut avg = WilderAverage::new(3).unwrap();
        assert_eq!(avg.next(3.0), None);
        assert_eq!(avg.next(6.0), None);
        assert_eq!(avg.next(9.0), Some(6.0));
        // alpha = 1/3
        assert!((avg.next(12.0).unwrap() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_rsi_first_value_matches_wilder() {
        // +10, then seven losses and six gains of 1
        let mut closes = vec![100.0, 110.0];
        for i in 0..13 {
            let last = closes[closes.len() - 1];
            closes.push(if i % 2 == 0 { last - 1.0 } else { last + 1.0 });
        }
        let values = rsi(&closes.iter().copied().map(Some).collect::<Vec<_>>(), 14).unwrap();

        assert!(values[..14].iter().all(Option::is_none));
        // average gain 16/14, average loss 7/14
        let expected = 100.0 * 16.0 / 23.0;
        assert!((values[14].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_ema_starts_from_sma() {
        let mut ema = SeededEma::new(3).unwrap();
        assert_eq!(ema.next(1.0), None);
        assert_eq!(ema.next(2.0), None);
        assert_eq!(ema.next(3.0), Some(2.0));
        // k = 0.5
        assert_eq!(ema.next(6.0), Some(4.0));
        assert_eq!(ema.to_string(), "EMA(3)");
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(WilderRsi::new(0).is_err());
        assert!(SeededEma::new(0).is_err());
    }

    #[test]
    fn test_rsi_bounds_and_warmup() {
        let mut table = table_from(&zigzag(60));
        append_rsi(&mut table).unwrap();
        let values = table.column(RSI_COLUMN).unwrap();

        assert!(values[..RSI_PERIOD].iter().all(Option::is_none));
        assert!(values[RSI_PERIOD..].iter().all(Option::is_some));
        for value in values.iter().flatten() {
            assert!((0.0..=100.0).contains(value), "RSI out of range: {value}");
        }
    }

    #[test]
    fn test_rsi_of_rising_prices_is_100() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64).collect();
        let values = rsi(&closes.iter().copied().map(Some).collect::<Vec<_>>(), 14).unwrap();
        assert!((values[29].unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_skips_undefined_closes() {
        let mut closes: Vec<Option<f64>> = (0..20).map(|i| Some(10.0 + i as f64)).collect();
        closes[16] = None;
        let values = rsi(&closes, 14).unwrap();
        assert_eq!(values[16], None);
        assert!(values[17].is_some());
    }

    #[test]
    fn test_macd_warmup_rows() {
        let mut table = table_from(&zigzag(60));
        append_macd(&mut table).unwrap();

        let line = table.column(MACD_COLUMN).unwrap();
        let signal = table.column(MACD_SIGNAL_COLUMN).unwrap();
        assert!(line[..MACD_SLOW - 1].iter().all(Option::is_none));
        assert!(line[MACD_SLOW - 1].is_some());
        assert!(signal[..MACD_SLOW + MACD_SIGNAL - 2].iter().all(Option::is_none));
        assert!(signal[MACD_SLOW + MACD_SIGNAL - 2].is_some());
    }

    #[test]
    fn test_histogram_is_macd_minus_signal() {
        let mut table = table_from(&zigzag(80));
        calculate_technical_indicators(&mut table).unwrap();

        let line = table.column(MACD_COLUMN).unwrap();
        let signal = table.column(MACD_SIGNAL_COLUMN).unwrap();
        let histogram = table.column(MACD_HIST_COLUMN).unwrap();
        for i in 0..table.len() {
            match (line[i], signal[i]) {
                (Some(m), Some(s)) => assert!((histogram[i].unwrap() - (m - s)).abs() < 1e-12),
                _ => assert!(histogram[i].is_none()),
            }
        }
    }

    #[test]
    fn test_short_table_gets_undefined_columns() {
        let mut table = table_from(&[1.0, 2.0, 3.0]);
        calculate_technical_indicators(&mut table).unwrap();

        for name in [RSI_COLUMN, MACD_COLUMN, MACD_SIGNAL_COLUMN, MACD_HIST_COLUMN] {
            assert!(table.column(name).unwrap().iter().all(Option::is_none));
        }
    }

    #[test]
    fn test_missing_close_column() {
        let mut table = PriceTable::new(vec![]);
        assert!(matches!(
            calculate_technical_indicators(&mut table),
            Err(StockError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_invalid_macd_periods() {
        assert!(macd(&[Some(1.0)], 26, 12, 9).is_err());
    }
}
