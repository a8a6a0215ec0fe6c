//! Draws [`ChartSpec`]s with egui_plot

use chrono::{Datelike, NaiveDate};
use egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, HLine, Legend, Line, LineStyle, Plot, PlotPoints};
use lens_stock::ChartTheme;
use lens_stock::charts::{ChartSpec, SeriesColor};
use std::ops::RangeInclusive;

/// Plot x coordinate of a trading date
pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Axis label for plot x coordinate `x`
pub fn x_to_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Decimal places for y ticks given the visible span
fn y_decimals(range: &RangeInclusive<f64>) -> usize {
    let span = (range.end() - range.start()).abs();
    if span >= 100.0 {
        0
    } else if span >= 1.0 {
        1
    } else {
        3
    }
}

fn color(c: SeriesColor) -> Color32 {
    let [r, g, b] = c.rgb();
    Color32::from_rgb(r, g, b)
}

/// Draw one chart with its title
pub fn show_chart(ui: &mut Ui, spec: &ChartSpec, theme: &ChartTheme) {
    ui.label(RichText::new(&spec.title).size(16.0).strong());

    let y_theme = theme.clone();
    let plot = Plot::new(spec.id)
        .view_aspect(spec.aspect)
        .legend(Legend::default())
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone())
        .x_axis_formatter(|mark: GridMark, _max_chars, _range| x_to_label(mark.value))
        .y_axis_formatter(move |mark: GridMark, _max_chars, range| {
            y_theme.format_number(mark.value, y_decimals(range))
        })
        .allow_boxed_zoom(false);

    plot.show(ui, |plot_ui| {
        if let Some(series) = &spec.bars {
            let bars: Vec<Bar> = series
                .bars
                .iter()
                .map(|(date, value)| Bar::new(date_to_x(*date), *value).width(0.8))
                .collect();
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name(&series.label)
                    .color(color(series.color).gamma_multiply(series.opacity)),
            );
        }

        for series in &spec.lines {
            for segment in &series.segments {
                let points: PlotPoints = segment
                    .iter()
                    .map(|(date, value)| [date_to_x(*date), *value])
                    .collect::<Vec<_>>()
                    .into();
                plot_ui.line(
                    Line::new(points)
                        .name(&series.label)
                        .color(color(series.color))
                        .width(1.5),
                );
            }
        }

        for reference in &spec.reference_lines {
            plot_ui.hline(
                HLine::new(reference.value)
                    .name(&reference.label)
                    .color(color(reference.color))
                    .style(LineStyle::dashed_loose()),
            );
        }
    });
}
