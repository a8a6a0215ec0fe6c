//! The dashboard window: sidebar form on the left, results on the right

use crate::report::ReportView;
use crate::{fonts, plot, strings};
use chrono::NaiveDate;
use egui::{Color32, RichText, Ui};
use egui_extras::DatePickerButton;
use lens_prompt::Language;
use lens_stock::{AnalysisPipeline, AnalysisQuery, AnalysisRun, Banner, BannerLevel, ChartTheme};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

/// Current values of the sidebar inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryForm {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl QueryForm {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }

    /// `None` for a completely empty ticker; whitespace goes on to the
    /// pipeline, which reports it as invalid input.
    pub fn to_query(&self) -> Option<AnalysisQuery> {
        if self.ticker.is_empty() {
            return None;
        }
        Some(AnalysisQuery::new(self.ticker.clone(), self.start, self.end))
    }
}

/// Shown in place of the AI report when no API key is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNotice {
    pub warning: String,
    pub help: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Idle,
    /// `painted` flips once the busy indicator has been drawn
    Running { query: AnalysisQuery, painted: bool },
}

/// Startup results the window is built from
pub struct Startup {
    pub runtime: Runtime,
    pub pipeline: AnalysisPipeline,
    pub theme: ChartTheme,
    pub notices: Vec<Banner>,
    pub font_halted: bool,
    pub key_notice: Option<KeyNotice>,
    pub form: QueryForm,
}

pub struct DashboardApp {
    runtime: Runtime,
    pipeline: AnalysisPipeline,
    theme: ChartTheme,
    language: Language,
    notices: Vec<Banner>,
    font_halted: bool,
    key_notice: Option<KeyNotice>,
    form: QueryForm,
    empty_ticker: bool,
    state: AppState,
    last_run: Option<AnalysisRun>,
    report: ReportView,
}

fn banner_color(level: BannerLevel) -> Color32 {
    match level {
        BannerLevel::Info => Color32::from_rgb(70, 130, 200),
        BannerLevel::Success => Color32::from_rgb(40, 150, 70),
        BannerLevel::Warning => Color32::from_rgb(200, 140, 20),
        BannerLevel::Error => Color32::from_rgb(210, 50, 50),
    }
}

fn show_banner(ui: &mut Ui, banner: &Banner) {
    ui.colored_label(banner_color(banner.level), &banner.text);
}

/// Mirror a banner into the log
pub fn log_banner(banner: &Banner) {
    match banner.level {
        BannerLevel::Info | BannerLevel::Success => info!("{}", banner.text),
        BannerLevel::Warning => warn!("{}", banner.text),
        BannerLevel::Error => error!("{}", banner.text),
    }
}

impl DashboardApp {
    pub fn new(startup: Startup) -> Self {
        let language = startup.pipeline.language().clone();
        Self {
            runtime: startup.runtime,
            pipeline: startup.pipeline,
            theme: startup.theme,
            language,
            notices: startup.notices,
            font_halted: startup.font_halted,
            key_notice: startup.key_notice,
            form: startup.form,
            empty_ticker: false,
            state: AppState::Idle,
            last_run: None,
            report: ReportView::default(),
        }
    }

    /// Install fonts into a freshly created egui context
    pub fn setup(&self, ctx: &egui::Context) {
        fonts::install(ctx, &self.theme);
    }

    fn is_running(&self) -> bool {
        matches!(self.state, AppState::Running { .. })
    }

    fn submit(&mut self) {
        match self.form.to_query() {
            Some(query) => {
                self.empty_ticker = false;
                self.state = AppState::Running {
                    query,
                    painted: false,
                };
            }
            None => self.empty_ticker = true,
        }
    }

    /// Run a pending query once its busy frame is on screen
    fn advance(&mut self, ctx: &egui::Context) {
        let query = match &mut self.state {
            AppState::Idle => return,
            AppState::Running { painted, .. } if !*painted => {
                *painted = true;
                ctx.request_repaint();
                return;
            }
            AppState::Running { query, .. } => query.clone(),
        };

        info!("Running analysis for '{}'", query.ticker);
        let run = self.runtime.block_on(self.pipeline.run(&query));
        run.banners.iter().for_each(log_banner);

        self.last_run = Some(run);
        self.state = AppState::Idle;
        ctx.request_repaint();
    }

    fn sidebar(&mut self, ui: &mut Ui) {
        let lang = self.language.clone();
        ui.heading(strings::sidebar_header(&lang));
        ui.add_space(8.0);

        ui.label(strings::ticker_label(&lang));
        ui.text_edit_singleline(&mut self.form.ticker);
        ui.label(strings::start_label(&lang));
        ui.add(DatePickerButton::new(&mut self.form.start).id_source("start_date"));
        ui.label(strings::end_label(&lang));
        ui.add(DatePickerButton::new(&mut self.form.end).id_source("end_date"));
        ui.add_space(8.0);

        let enabled = !self.is_running() && !self.font_halted;
        if ui
            .add_enabled(enabled, egui::Button::new(strings::run_button(&lang)))
            .clicked()
        {
            self.submit();
        }

        if self.is_running() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(strings::running(&lang));
            });
        }

        if self.empty_ticker {
            ui.colored_label(banner_color(BannerLevel::Warning), strings::empty_ticker(&lang));
        }

        if self.font_halted {
            ui.colored_label(banner_color(BannerLevel::Error), strings::font_halted(&lang));
        }

        ui.separator();
        ui.colored_label(banner_color(BannerLevel::Info), strings::disclaimer(&lang));
    }

    fn main_panel(&mut self, ui: &mut Ui) {
        let lang = &self.language;
        ui.heading(RichText::new(strings::window_title(lang)).size(26.0));

        for notice in &self.notices {
            show_banner(ui, notice);
        }
        if let Some(notice) = &self.key_notice {
            show_banner(ui, &Banner::warning(notice.warning.clone()));
            ui.label(&notice.help);
        }
        ui.separator();

        let Some(run) = &self.last_run else {
            return;
        };

        egui::ScrollArea::vertical().show(ui, |ui| {
            for banner in &run.banners {
                show_banner(ui, banner);
            }

            if let Some(charts) = &run.charts {
                ui.add_space(8.0);
                ui.heading(strings::charts_heading(lang, &charts.ticker));
                for spec in charts.charts() {
                    plot::show_chart(ui, spec, &self.theme);
                    ui.add_space(12.0);
                }
            }

            if let Some(text) = &run.report {
                ui.heading(strings::report_heading(lang));
                self.report.show(ui, text);
            }
        });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("settings")
            .resizable(false)
            .default_width(280.0)
            .show(ctx, |ui| self.sidebar(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.main_panel(ui));

        self.advance(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_form_to_query() {
        let form = QueryForm::new("2330.TW", date(1, 1), date(6, 30));
        assert_eq!(
            form.to_query(),
            Some(AnalysisQuery::new("2330.TW", date(1, 1), date(6, 30)))
        );
    }

    #[test]
    fn test_empty_ticker_blocks_run() {
        let mut form = QueryForm::new("", date(1, 1), date(6, 30));
        assert_eq!(form.to_query(), None);

        form.ticker = "   ".to_string();
        assert!(form.to_query().is_some());
    }
}
