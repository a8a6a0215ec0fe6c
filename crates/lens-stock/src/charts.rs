//! Chart specifications built from an indicator-augmented table
//!
//! A [`ChartSet`] is plain data: the GUI turns each [`ChartSpec`] into plot
//! items. Undefined cells split a line into separate segments so gaps stay
//! visible instead of being bridged.

use crate::indicators::{
    MACD_COLUMN, MACD_HIST_COLUMN, MACD_SIGNAL_COLUMN, OVERBOUGHT, OVERSOLD, RSI_COLUMN,
};
use crate::table::{CLOSE, PriceTable};
use chrono::NaiveDate;
use lens_prompt::Language;

/// Named colors used by the charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesColor {
    Blue,
    Orange,
    Red,
    Green,
    Grey,
}

impl SeriesColor {
    /// sRGB components
    pub fn rgb(self) -> [u8; 3] {
        match self {
            SeriesColor::Blue => [31, 119, 180],
            SeriesColor::Orange => [255, 127, 14],
            SeriesColor::Red => [214, 39, 40],
            SeriesColor::Green => [44, 160, 44],
            SeriesColor::Grey => [128, 128, 128],
        }
    }
}

/// A contiguous run of defined points
pub type Segment = Vec<(NaiveDate, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub label: String,
    pub color: SeriesColor,
    pub segments: Vec<Segment>,
}

impl LineSeries {
    fn from_values(label: &str, color: SeriesColor, table: &PriceTable, column: &str) -> Self {
        Self {
            label: label.to_string(),
            color,
            segments: segments(&table.series(column)),
        }
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }
}

/// Dashed horizontal line at a fixed value
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub label: String,
    pub value: f64,
    pub color: SeriesColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub label: String,
    pub color: SeriesColor,
    pub opacity: f32,
    pub bars: Vec<(NaiveDate, f64)>,
}

/// Everything needed to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Width over height
    pub aspect: f32,
    pub lines: Vec<LineSeries>,
    pub reference_lines: Vec<ReferenceLine>,
    pub bars: Option<BarSeries>,
}

impl ChartSpec {
    /// Whether nothing would be drawn apart from reference lines
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.segments.is_empty())
            && self.bars.as_ref().is_none_or(|b| b.bars.is_empty())
    }
}

/// The three dashboard charts
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSet {
    pub ticker: String,
    pub price: ChartSpec,
    pub rsi: ChartSpec,
    pub macd: ChartSpec,
}

impl ChartSet {
    /// Build the close-price, RSI and MACD charts
    ///
    /// Missing or all-undefined indicator columns produce empty series.
    pub fn from_table(table: &PriceTable, ticker: &str, language: &Language) -> Self {
        let x_label = language.pick("Date", "日期").to_string();

        let price = ChartSpec {
            id: "price",
            title: match language {
                Language::TraditionalChinese => format!("{ticker} 收盤價"),
                _ => format!("{ticker} Close Price"),
            },
            x_label: x_label.clone(),
            y_label: language.pick("Price", "價格").to_string(),
            aspect: 2.0,
            lines: vec![LineSeries::from_values(
                language.pick("Close", "收盤價"),
                SeriesColor::Blue,
                table,
                CLOSE,
            )],
            reference_lines: Vec::new(),
            bars: None,
        };

        let rsi = ChartSpec {
            id: "rsi",
            title: language
                .pick("Relative Strength Index (RSI)", "相對強弱指數 (RSI)")
                .to_string(),
            x_label: x_label.clone(),
            y_label: "RSI".to_string(),
            aspect: 3.0,
            lines: vec![LineSeries::from_values(
                language.pick("RSI (14)", "RSI (14天)"),
                SeriesColor::Orange,
                table,
                RSI_COLUMN,
            )],
            reference_lines: vec![
                ReferenceLine {
                    label: language.pick("Overbought (70)", "超買 (70)").to_string(),
                    value: OVERBOUGHT,
                    color: SeriesColor::Red,
                },
                ReferenceLine {
                    label: language.pick("Oversold (30)", "超賣 (30)").to_string(),
                    value: OVERSOLD,
                    color: SeriesColor::Green,
                },
            ],
            bars: None,
        };

        let macd = ChartSpec {
            id: "macd",
            title: language
                .pick(
                    "Moving Average Convergence Divergence (MACD)",
                    "平滑異同移動平均線 (MACD)",
                )
                .to_string(),
            x_label,
            y_label: "MACD".to_string(),
            aspect: 3.0,
            lines: vec![
                LineSeries::from_values("MACD", SeriesColor::Blue, table, MACD_COLUMN),
                LineSeries::from_values(
                    language.pick("Signal", "信號線"),
                    SeriesColor::Red,
                    table,
                    MACD_SIGNAL_COLUMN,
                ),
            ],
            reference_lines: Vec::new(),
            bars: Some(BarSeries {
                label: language.pick("Histogram", "柱狀圖").to_string(),
                color: SeriesColor::Grey,
                opacity: 0.5,
                bars: table
                    .series(MACD_HIST_COLUMN)
                    .into_iter()
                    .filter_map(|(date, value)| value.map(|v| (date, v)))
                    .collect(),
            }),
        };

        Self {
            ticker: ticker.to_string(),
            price,
            rsi,
            macd,
        }
    }

    /// Charts in display order
    pub fn charts(&self) -> [&ChartSpec; 3] {
        [&self.price, &self.rsi, &self.macd]
    }
}

/// Split a series into runs of defined values
pub fn segments(series: &[(NaiveDate, Option<f64>)]) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = Segment::new();
    for &(date, value) in series {
        match value {
            Some(v) if v.is_finite() => current.push((date, v)),
            _ => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
