//! In-memory time series tables
//!
//! [`RawTable`] is what a [`BarProvider`](crate::api::BarProvider) hands back:
//! column headers may carry several levels (price field and ticker).
//! [`PriceTable`] is the normalized form every later stage works on: one row per
//! trading day in ascending date order, single-level unique column names, and
//! cells that may be undefined.

use crate::error::{Result, StockError};
use chrono::NaiveDate;
use std::collections::HashSet;

pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

/// A named column of optional values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Daily price table indexed by trading date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl PriceTable {
    /// Empty table over the given dates
    pub fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`column`](Self::column) but a missing column is an error
    pub fn require(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .ok_or_else(|| StockError::MissingColumn(name.to_string()))
    }

    /// Append a column, replacing any existing column of the same name in place
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(StockError::TableError(format!(
                "column '{name}' has {} values but the table has {} rows",
                values.len(),
                self.index.len()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Value of `name` in the most recent row
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.column(name)?.last().copied().flatten()
    }

    /// Largest defined value of `name`
    pub fn max(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().flatten().copied().reduce(f64::max)
    }

    /// Smallest defined value of `name`
    pub fn min(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().flatten().copied().reduce(f64::min)
    }

    /// `(date, value)` pairs of a column; empty if the column is absent
    pub fn series(&self, name: &str) -> Vec<(NaiveDate, Option<f64>)> {
        self.column(name)
            .map(|values| self.index.iter().copied().zip(values.iter().copied()).collect())
            .unwrap_or_default()
    }
}

/// A column header with one or more levels
///
/// Single-level headers hold just the field name. Multi-level headers come
/// from feeds that label each column with both the price field and the ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnHeader(Vec<String>);

impl ColumnHeader {
    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn multi<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(levels.into_iter().map(Into::into).collect())
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Name at `level`, clamped to the innermost level
    fn name_at(&self, level: usize) -> &str {
        self.0
            .get(level)
            .or_else(|| self.0.last())
            .map_or("", String::as_str)
    }
}

/// Provider output before normalization
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    index: Vec<NaiveDate>,
    headers: Vec<ColumnHeader>,
    data: Vec<Vec<Option<f64>>>,
}

impl RawTable {
    pub fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            headers: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Add a column; its length must match the index
    pub fn push_column(&mut self, header: ColumnHeader, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.index.len() {
            return Err(StockError::TableError(format!(
                "column {:?} has {} values but the index has {} rows",
                header.levels(),
                values.len(),
                self.index.len()
            )));
        }
        self.headers.push(header);
        self.data.push(values);
        Ok(())
    }

    /// Builder-style [`push_column`](Self::push_column)
    pub fn with_column(mut self, header: ColumnHeader, values: Vec<Option<f64>>) -> Result<Self> {
        self.push_column(header, values)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_multi_level(&self) -> bool {
        self.headers.iter().any(|h| h.depth() > 1)
    }

    /// Collapse headers to field names and order rows by date
    ///
    /// Multi-level headers keep the price-field level: the first level, unless
    /// every first level equals `symbol`, in which case the second level is the
    /// field. Duplicate names that result are dropped, keeping the first
    /// occurrence and the original column order.
    pub fn normalize(self, symbol: &str) -> PriceTable {
        let level = if self.is_multi_level()
            && self
                .headers
                .iter()
                .all(|h| h.depth() > 1 && h.name_at(0).eq_ignore_ascii_case(symbol))
        {
            1
        } else {
            0
        };

        let mut order: Vec<usize> = (0..self.index.len()).collect();
        order.sort_by_key(|&row| self.index[row]);

        let mut table = PriceTable::new(order.iter().map(|&row| self.index[row]).collect());
        let mut seen = HashSet::new();
        for (header, values) in self.headers.iter().zip(self.data) {
            let name = header.name_at(level);
            if !seen.insert(name.to_string()) {
                continue;
            }
            let values = order.iter().map(|&row| values[row]).collect();
            table.columns.push(Column {
                name: name.to_string(),
                values,
            });
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_set_column_replaces_existing() {
        let mut table = PriceTable::new(vec![day(2), day(3)]);
        table.set_column(CLOSE, vec![Some(1.0), Some(2.0)]).unwrap();
        table.set_column("RSI_14", vec![None, None]).unwrap();
        table.set_column(CLOSE, vec![Some(5.0), None]).unwrap();

        assert_eq!(table.column_names(), vec![CLOSE, "RSI_14"]);
        assert_eq!(table.column(CLOSE).unwrap(), &[Some(5.0), None]);
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut table = PriceTable::new(vec![day(2), day(3)]);
        let result = table.set_column(CLOSE, vec![Some(1.0)]);
        assert!(matches!(result, Err(StockError::TableError(_))));
    }

    #[test]
    fn test_latest_max_min() {
        let mut table = PriceTable::new(vec![day(2), day(3), day(4)]);
        table
            .set_column(CLOSE, vec![Some(10.0), None, Some(7.5)])
            .unwrap();
        table.set_column("RSI_14", vec![None, None, None]).unwrap();

        assert_eq!(table.latest(CLOSE), Some(7.5));
        assert_eq!(table.max(CLOSE), Some(10.0));
        assert_eq!(table.min(CLOSE), Some(7.5));
        assert_eq!(table.latest("RSI_14"), None);
        assert_eq!(table.max("RSI_14"), None);
        assert_eq!(table.latest("missing"), None);
        assert!(matches!(
            table.require("missing"),
            Err(StockError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_normalize_field_outer_multi_level() {
        let raw = RawTable::new(vec![day(2), day(3)])
            .with_column(ColumnHeader::multi(["Close", "2330.TW"]), vec![Some(1.0), Some(2.0)])
            .unwrap()
            .with_column(ColumnHeader::multi(["High", "2330.TW"]), vec![Some(3.0), Some(4.0)])
            .unwrap()
            .with_column(ColumnHeader::multi(["Close", "2330.TW"]), vec![Some(9.0), Some(9.0)])
            .unwrap();
        assert!(raw.is_multi_level());

        let table = raw.normalize("2330.TW");
        assert_eq!(table.column_names(), vec!["Close", "High"]);
        assert_eq!(table.column("Close").unwrap(), &[Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_normalize_ticker_outer_multi_level() {
        let raw = RawTable::new(vec![day(2)])
            .with_column(ColumnHeader::multi(["2330.TW", "Open"]), vec![Some(1.0)])
            .unwrap()
            .with_column(ColumnHeader::multi(["2330.TW", "Close"]), vec![Some(2.0)])
            .unwrap()
            .with_column(ColumnHeader::multi(["2330.TW", "Volume"]), vec![Some(3.0)])
            .unwrap();

        let table = raw.normalize("2330.tw");
        assert_eq!(table.column_names(), vec!["Open", "Close", "Volume"]);
    }

    #[test]
    fn test_normalize_single_level_drops_duplicates_and_sorts() {
        let raw = RawTable::new(vec![day(4), day(2), day(3)])
            .with_column(ColumnHeader::single("Close"), vec![Some(4.0), Some(2.0), Some(3.0)])
            .unwrap()
            .with_column(ColumnHeader::single("Close"), vec![None, None, None])
            .unwrap();
        assert!(!raw.is_multi_level());

        let table = raw.normalize("AAPL");
        assert_eq!(table.dates(), &[day(2), day(3), day(4)]);
        assert_eq!(table.column_names(), vec!["Close"]);
        assert_eq!(table.column("Close").unwrap(), &[Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_series_pairs_dates() {
        let mut table = PriceTable::new(vec![day(2), day(3)]);
        table.set_column(CLOSE, vec![Some(1.0), None]).unwrap();
        assert_eq!(table.series(CLOSE), vec![(day(2), Some(1.0)), (day(3), None)]);
        assert!(table.series("absent").is_empty());
    }
}
