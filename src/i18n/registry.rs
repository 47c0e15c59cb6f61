//! Language registry: Single source of truth for all supported languages.
//!
//! The set is fixed at build time. It uses a singleton pattern with `OnceLock`
//! so every component sees the same immutable table.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "uk")
    pub code: &'static str,

    /// Human-readable name shown in the language switchers (e.g., "Українська")
    pub display_name: &'static str,

    /// Whether this is the default language (exactly one must be true)
    pub is_default: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: supported_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// Matching is exact: "EN" and "en-US" are not members.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// All supported languages, in switcher order.
    pub fn list(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// Get the default language configuration.
    ///
    /// # Panics
    /// Panics if the build-time table does not contain exactly one default
    /// language (this indicates a configuration error).
    pub fn default_language(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self.languages.iter().filter(|l| l.is_default).collect();

        match defaults.len() {
            0 => panic!("No default language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default languages found in registry"),
        }
    }

    /// Check if a language code is supported.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

/// Supported languages, in the order the switchers list them.
fn supported_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            display_name: "English",
            is_default: true,
        },
        LanguageConfig {
            code: "uk",
            display_name: "Українська",
            is_default: false,
        },
        LanguageConfig {
            code: "de",
            display_name: "Deutsch",
            is_default: false,
        },
        LanguageConfig {
            code: "es",
            display_name: "Español",
            is_default: false,
        },
        LanguageConfig {
            code: "fr",
            display_name: "Français",
            is_default: false,
        },
        LanguageConfig {
            code: "pt",
            display_name: "Português",
            is_default: false,
        },
    ]
}
