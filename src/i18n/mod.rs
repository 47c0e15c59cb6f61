//! Client-side localization for the landing pages.
//!
//! Every page composes the same pipeline: resolve a language, load its
//! dictionary, render it into the document, keep the switchers in step and
//! announce changes to the other page scripts.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for the supported languages
//! - `language`: Validated `Language` type
//! - `resolver`: Picks the language from request, preference and locale
//! - `table` / `store`: Dictionary model and loading with default fallback
//! - `applicator`: Writes translations into the document
//! - `switcher`: Language selection controls
//! - `transition`: Fades, the page-visible safety timer and the pre-paint hold
//! - `events`: `LanguageChanged` notifications
//! - `controller`: The `I18n` façade composing all of the above
//! - `validator` / `metrics`: Locale file checks and load statistics
//!
//! # Example
//!
//! ```rust,ignore
//! let i18n = Arc::new(I18n::new(document, fetcher, preferences, I18nOptions::default()));
//! i18n.init().await?;
//! i18n.spawn_switcher_events();
//! let mut changes = i18n.subscribe();
//! ```

pub mod applicator;
pub mod controller;
mod error;
mod events;
mod language;
mod metrics;
mod registry;
pub mod resolver;
pub mod store;
pub mod switcher;
mod table;
pub mod transition;
mod validator;

pub use controller::{ChangeOutcome, I18n, I18nOptions};
pub use error::{I18nError, LoadError};
pub use events::{LanguageChanged, LanguageEvents};
pub use language::Language;
pub use metrics::{I18nMetrics, MetricsReport};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use store::{HttpLocaleFetcher, LocaleFetcher, Loaded, TranslationStore};
pub use table::TranslationTable;
pub use transition::Phase;
pub use validator::{LocaleValidator, ValidationReport};
