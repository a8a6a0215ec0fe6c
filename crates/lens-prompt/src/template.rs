//! Core prompt template trait

use crate::{Language, PromptError, Result};

/// A named prompt with one variant per language
pub trait PromptTemplate: Send + Sync {
    /// Unique template name
    fn name(&self) -> &str;

    /// Languages this template has a variant for
    fn languages(&self) -> Vec<Language>;

    /// Whether a variant exists for `lang`
    fn supports_language(&self, lang: &Language) -> bool {
        self.languages().contains(lang)
    }

    /// Render the variant for `lang` with the given variables
    fn render(&self, lang: &Language, vars: &serde_json::Value) -> Result<String>;

    /// Render for `lang`, falling back to English, then to any variant
    fn render_with_fallback(&self, lang: &Language, vars: &serde_json::Value) -> Result<String> {
        if self.supports_language(lang) {
            return self.render(lang, vars);
        }

        if self.supports_language(&Language::English) {
            return self.render(&Language::English, vars);
        }

        let fallback = self
            .languages()
            .into_iter()
            .next()
            .ok_or_else(|| PromptError::NoLanguageAvailable(self.name().to_string()))?;

        self.render(&fallback, vars)
    }
}
