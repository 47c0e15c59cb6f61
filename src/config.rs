use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use std::time::Duration;
use tracing::warn;

const DEFAULT_MAINTENANCE_END: &str = "2025-12-31T18:00:00+03:00";

#[derive(Debug, Clone)]
pub struct Config {
    // Site
    pub site_base_url: String,

    // Transitions
    pub fade_duration: Duration,
    pub safety_timeout: Duration,
    pub initial_loading_hold: Duration,

    // Persistence
    pub preferences_file: String,

    // Page scripts
    pub hero_typing_speed: Duration,
    pub maintenance_end: DateTime<FixedOffset>,
    pub redirect_seconds: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Site
            site_base_url: std::env::var("SITE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),

            // Transitions (must match the CSS durations)
            fade_duration: millis_var("FADE_DURATION_MS", 250),
            safety_timeout: millis_var("SAFETY_TIMEOUT_MS", 1000),
            initial_loading_hold: millis_var("INITIAL_LOADING_HOLD_MS", 1500),

            // Persistence
            preferences_file: std::env::var("PREFERENCES_FILE")
                .unwrap_or_else(|_| ".landing_prefs.json".to_string()),

            // Page scripts
            hero_typing_speed: millis_var("HERO_TYPING_SPEED_MS", 160),
            maintenance_end: maintenance_end_var(),
            redirect_seconds: std::env::var("REDIRECT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}

/// Only the maintenance page reads this, so a bad value must not stop the
/// other tools: it is logged and replaced by the default.
fn maintenance_end_var() -> DateTime<FixedOffset> {
    let default = || {
        DateTime::parse_from_rfc3339(DEFAULT_MAINTENANCE_END)
            .expect("default maintenance end is valid RFC 3339")
    };
    match std::env::var("MAINTENANCE_END") {
        Ok(value) => DateTime::parse_from_rfc3339(&value).unwrap_or_else(|e| {
            warn!("MAINTENANCE_END is not RFC 3339 ({}): {}", e, value);
            default()
        }),
        Err(_) => default(),
    }
}

fn millis_var(name: &str, default: u64) -> Duration {
    Duration::from_millis(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}
