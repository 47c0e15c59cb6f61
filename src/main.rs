//! Locale check: fetches every supported dictionary from the site and
//! validates it against the default language.
//!
//! Usage:
//!   cargo run                      # Check against SITE_BASE_URL
//!   cargo run -- --warnings-fatal  # Also fail on extra keys / markup drift

use anyhow::{bail, Context, Result};
use futures::future::join_all;
use landing_i18n::config::Config;
use landing_i18n::i18n::{
    HttpLocaleFetcher, Language, LanguageRegistry, LocaleFetcher, LocaleValidator,
    ValidationReport,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
struct CheckReport {
    site: String,
    default_language: &'static str,
    locales: BTreeMap<&'static str, LocaleStatus>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum LocaleStatus {
    Checked(ValidationReport),
    Unavailable { error: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("landing_i18n=info".parse()?),
        )
        .init();

    let warnings_fatal = std::env::args().any(|arg| arg == "--warnings-fatal");
    let config = Config::from_env()?;
    let fetcher = HttpLocaleFetcher::new(reqwest::Client::new(), &config.site_base_url);

    info!("Checking locales at {}", config.site_base_url);

    let default = Language::default_language();
    let reference = fetcher
        .fetch(default)
        .await
        .with_context(|| format!("Default locale '{}' is unavailable", default))?;

    let others: Vec<Language> = LanguageRegistry::get()
        .list()
        .iter()
        .filter(|config| !config.is_default)
        .filter_map(|config| Language::from_code(config.code).ok())
        .collect();
    let results = join_all(others.iter().map(|&language| fetcher.fetch(language))).await;

    let mut locales = BTreeMap::new();
    let mut failed = false;
    for (language, result) in others.iter().zip(results) {
        let status = match result {
            Ok(table) => {
                let report = LocaleValidator::validate(&reference, &table);
                if report.has_errors() || (warnings_fatal && report.has_warnings()) {
                    failed = true;
                }
                if report.has_warnings() {
                    warn!("{}: {} warnings", language, report.warnings.len());
                }
                LocaleStatus::Checked(report)
            }
            Err(e) => {
                error!("{}: {}", language, e);
                failed = true;
                LocaleStatus::Unavailable {
                    error: e.to_string(),
                }
            }
        };
        locales.insert(language.code(), status);
    }

    let report = CheckReport {
        site: config.site_base_url.clone(),
        default_language: default.code(),
        locales,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if failed {
        bail!("Locale check failed");
    }
    info!("All locales consistent with '{}'", default);
    Ok(())
}
