//! Localization metrics and observability.
//!
//! Counters are owned by one i18n controller rather than a process global,
//! so independent pages (and tests) never share them.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for locale loading and language changes.
#[derive(Debug, Default)]
pub struct I18nMetrics {
    /// Locale resources requested (including fallback attempts)
    loads: AtomicUsize,

    /// Locale resources that failed to load
    load_failures: AtomicUsize,

    /// Times the default language was substituted for a failed one
    fallbacks: AtomicUsize,

    /// Completed runtime language changes
    language_changes: AtomicUsize,
}

impl I18nMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_language_change(&self) {
        self.language_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn language_changes(&self) -> usize {
        self.language_changes.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let loads = self.loads();
        let failures = self.load_failures();
        let load_success_rate = if loads > 0 {
            (loads.saturating_sub(failures) as f64 / loads as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            loads,
            load_failures: failures,
            load_success_rate,
            fallbacks: self.fallbacks(),
            language_changes: self.language_changes(),
        }
    }
}

/// Metrics report containing current localization statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub loads: usize,
    pub load_failures: usize,

    /// Load success rate as a percentage (0-100)
    pub load_success_rate: f64,

    pub fallbacks: usize,
    pub language_changes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = I18nMetrics::new();
        assert_eq!(metrics.loads(), 0);
        assert_eq!(metrics.load_failures(), 0);
        assert_eq!(metrics.fallbacks(), 0);
        assert_eq!(metrics.language_changes(), 0);
    }

    #[test]
    fn test_report_empty() {
        let report = I18nMetrics::new().report();
        assert_eq!(report.loads, 0);
        assert_eq!(report.load_success_rate, 0.0);
    }

    #[test]
    fn test_report_success_rate() {
        let metrics = I18nMetrics::new();
        for _ in 0..4 {
            metrics.record_load();
        }
        metrics.record_load_failure();
        metrics.record_fallback();
        metrics.record_language_change();

        let report = metrics.report();
        assert_eq!(report.loads, 4);
        assert_eq!(report.load_failures, 1);
        assert!((report.load_success_rate - 75.0).abs() < 0.001);
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.language_changes, 1);
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_string(&I18nMetrics::new().report()).unwrap();
        assert!(json.contains("\"load_success_rate\""));
        assert!(json.contains("\"language_changes\""));
    }
}
