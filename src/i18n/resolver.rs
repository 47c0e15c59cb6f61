//! Language resolution: picks the active language from the page's inputs.
//!
//! Precedence, first supported match wins:
//! 1. explicit `lang` request parameter (marketing links)
//! 2. persisted preference
//! 3. client locale, truncated to its primary subtag
//! 4. the default language

use crate::i18n::{Language, LanguageRegistry};

/// The three external inputs, sampled once per resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverInputs {
    pub request_param: Option<String>,
    pub stored_preference: Option<String>,
    pub client_locale: Option<String>,
}

/// Resolve the language to display. Never fails.
pub fn resolve(inputs: &ResolverInputs) -> Language {
    let registry = LanguageRegistry::get();
    let locale = inputs.client_locale.as_deref().map(primary_subtag);

    let resolved = [
        inputs.request_param.as_deref(),
        inputs.stored_preference.as_deref(),
        locale.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|code| registry.is_supported(code))
    .and_then(|code| Language::from_code(code).ok())
    .unwrap_or_else(Language::default_language);
    resolved
}

/// "fr-FR" -> "fr", "pt_BR" -> "pt", "DE" -> "de".
pub fn primary_subtag(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
