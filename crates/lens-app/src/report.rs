//! Markdown display for the AI report

use egui::Ui;
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};

/// Body of a reply that arrived wrapped in a single ```markdown fence
///
/// Models sometimes fence the whole answer; rendered as-is it would show up
/// as one code block. Anything else is returned unchanged.
pub fn unwrap_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return text;
    };
    let Some((tag, inner)) = body.split_once('\n') else {
        return text;
    };
    if inner.contains("```") {
        return text;
    }
    match tag.trim() {
        "" | "markdown" | "md" => inner.trim(),
        _ => text,
    }
}

/// Renders the report, keeping CommonMark state between frames
#[derive(Default)]
pub struct ReportView {
    cache: CommonMarkCache,
}

impl ReportView {
    pub fn show(&mut self, ui: &mut Ui, markdown: &str) {
        CommonMarkViewer::new("ai_report").show(ui, &mut self.cache, unwrap_fence(markdown));
    }
}
