//! Translation table: one language's nested dictionary.

use serde_json::{Map, Value};

/// A tree of translation strings addressed by dot-delimited key paths.
///
/// Tables are replaced wholesale on every language change and never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationTable {
    root: Map<String, Value>,
}

impl TranslationTable {
    pub fn new(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Build a table from any JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Resolve a key path such as `hero.title`.
    ///
    /// Each segment indexes the previous result; numeric segments also index
    /// arrays. Returns `None` for absent segments, non-string leaves and
    /// empty strings.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        match current {
            Value::String(text) if !text.is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// Every key path that [`Self::lookup`] resolves, sorted.
    ///
    /// Empty strings are left out, matching lookup.
    pub fn key_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for (key, value) in &self.root {
            collect_paths(key.clone(), value, &mut paths);
        }
        paths.sort();
        paths
    }
}

fn collect_paths(prefix: String, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) if !text.is_empty() => out.push(prefix),
        Value::Object(map) => {
            for (key, child) in map {
                collect_paths(format!("{}.{}", prefix, key), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_paths(format!("{}.{}", prefix, index), child, out);
            }
        }
        _ => {}
    }
}
