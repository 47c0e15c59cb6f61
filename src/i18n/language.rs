//! Language type: validated member of the supported set.

use crate::i18n::{I18nError, LanguageConfig, LanguageRegistry};
use std::fmt;

/// A validated language.
///
/// Only codes present in the registry can be constructed, so every
/// `Language` in the program is a member of the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "uk")
    code: &'static str,
}

impl Language {
    /// English, the default language.
    pub const ENGLISH: Language = Language { code: "en" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is supported
    /// * `Err(I18nError::UnsupportedLanguage)` otherwise
    pub fn from_code(code: &str) -> Result<Language, I18nError> {
        LanguageRegistry::get()
            .get_by_code(code)
            .map(|config| Language { code: config.code })
            .ok_or_else(|| I18nError::UnsupportedLanguage(code.to_string()))
    }

    /// The language used when nothing else resolves and as the load fallback.
    pub fn default_language() -> Language {
        Language {
            code: LanguageRegistry::get().default_language().code,
        }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a Language built through `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// Name shown in the switchers (e.g., "Deutsch").
    pub fn display_name(&self) -> &'static str {
        self.config().display_name
    }

    pub fn is_default(&self) -> bool {
        self.config().is_default
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
