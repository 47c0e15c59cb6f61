//! Locale file validation.
//!
//! Compares a translated dictionary with the default-language dictionary:
//! every key the default defines should exist, stray keys are suspicious, and
//! the markup embedded in a value (line breaks, spans, links) should survive
//! translation.

use crate::i18n::TranslationTable;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Keys present in the reference but missing from the candidate
    pub errors: Vec<String>,

    /// Extra keys and markup drift
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LocaleValidator;

// Opening or closing tag name, e.g. "<br>", "</span>", "<a href=..>"
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

impl LocaleValidator {
    /// Validate `candidate` against the `reference` dictionary.
    pub fn validate(reference: &TranslationTable, candidate: &TranslationTable) -> ValidationReport {
        let mut report = ValidationReport::new();

        let expected: BTreeSet<String> = reference.key_paths().into_iter().collect();
        let actual: BTreeSet<String> = candidate.key_paths().into_iter().collect();

        for key in expected.difference(&actual) {
            report.errors.push(format!("Missing key: {}", key));
        }
        for key in actual.difference(&expected) {
            report.warnings.push(format!("Extra key: {}", key));
        }

        for key in expected.intersection(&actual) {
            let (Some(original), Some(translated)) = (reference.lookup(key), candidate.lookup(key))
            else {
                continue;
            };
            let orig_tags = Self::extract_tags(original);
            let trans_tags = Self::extract_tags(translated);
            if orig_tags != trans_tags {
                report.warnings.push(format!(
                    "Markup mismatch in {}: reference has {:?}, translation has {:?}",
                    key, orig_tags, trans_tags
                ));
            }
        }

        report
    }

    /// Tag names in a value, sorted so reordering inside a sentence is allowed.
    fn extract_tags(text: &str) -> Vec<String> {
        let regex = TAG_REGEX.get_or_init(|| Regex::new(r"</?([a-zA-Z][a-zA-Z0-9]*)[^>]*>").unwrap());

        let mut tags: Vec<String> = regex
            .captures_iter(text)
            .filter_map(|cap| {
                let whole = cap.get(0)?.as_str();
                let name = cap.get(1)?.as_str().to_ascii_lowercase();
                Some(if whole.starts_with("</") {
                    format!("/{}", name)
                } else {
                    name
                })
            })
            .collect();
        tags.sort();
        tags
    }
}
