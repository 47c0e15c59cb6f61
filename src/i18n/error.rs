use crate::i18n::Language;
use thiserror::Error;

/// Failure to load one language's translation resource.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request for {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not valid JSON: {reason}")]
    Parse { url: String, reason: String },

    #[error("{url} is not a JSON object")]
    NotAnObject { url: String },
}

/// Errors surfaced by the i18n façade.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("unsupported language code: '{0}'")]
    UnsupportedLanguage(String),

    /// Neither the requested language nor the default could be loaded.
    #[error("could not load translations for '{code}'")]
    LoadFailed {
        code: Language,
        #[source]
        source: LoadError,
    },
}
