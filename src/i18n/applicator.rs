//! Writes the resident translation table into the document.

use crate::dom::Document;
use crate::i18n::TranslationTable;
use tracing::debug;

/// Outcome of one [`apply`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    /// Keys with no string value; their elements were left untouched.
    pub missing: Vec<String>,
}

/// Render every translatable element from `table`.
///
/// Elements are queried fresh on each call. Missing keys are not errors.
/// Values are trusted build-time markup and are written unescaped.
pub fn apply<D: Document + ?Sized>(document: &mut D, table: &TranslationTable) -> ApplyReport {
    let mut report = ApplyReport::default();

    for element in document.translatable_elements() {
        match table.lookup(&element.key) {
            Some(text) => {
                document.write(element.node, element.target, text);
                report.applied += 1;
            }
            None => report.missing.push(element.key),
        }
    }

    if !report.missing.is_empty() {
        debug!("{} translation keys unresolved: {:?}", report.missing.len(), report.missing);
    }
    report
}
