//! Registers the provisioned chart font with egui

use egui::{FontData, FontDefinitions, FontFamily};
use lens_stock::ChartTheme;
use tracing::info;

/// Font definitions with the theme's font placed first in every family
///
/// The built-in fonts stay behind it as fallbacks, so Latin text and emoji
/// keep rendering when the custom font lacks glyphs.
pub fn font_definitions(theme: &ChartTheme) -> FontDefinitions {
    let mut fonts = FontDefinitions::default();
    let (Some(family), Some(bytes)) = (theme.font_family(), theme.font_bytes()) else {
        return fonts;
    };

    fonts
        .font_data
        .insert(family.to_owned(), FontData::from_owned(bytes.to_vec()));
    for font_family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(font_family)
            .or_default()
            .insert(0, family.to_owned());
    }
    fonts
}

/// Install the theme's fonts into `ctx`
pub fn install(ctx: &egui::Context, theme: &ChartTheme) {
    if let Some(family) = theme.font_family() {
        info!("Using chart font '{}'", family);
    }
    ctx.set_fonts(font_definitions(theme));
}
