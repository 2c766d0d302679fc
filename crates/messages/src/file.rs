//! Static messages files.
//!
//! Layout (YAML or JSON), one top-level key per locale:
//!
//! ```yaml
//! en:
//!   errors:
//!     email?: "must be an email"
//!     odd?: "must be odd"
//! ```
//!
//! The `errors` level is optional. Entries whose value is not a string are
//! skipped.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use sieve_core::MessageCatalog;

use crate::error::MessagesError;

/// Messages keyed by `(locale, predicate_name)`.
#[derive(Debug, Clone, Default)]
pub struct MessageFile {
    entries: HashMap<(String, String), String>,
}

impl MessageFile {
    /// Load a `.yml`, `.yaml` or `.json` messages file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MessagesError> {
        let path = path.as_ref();
        let file = Self::from_tree(read_tree(path)?)?;
        tracing::debug!(
            path = %path.display(),
            entries = file.len(),
            "Loaded messages file"
        );
        Ok(file)
    }

    pub fn from_yaml_str(src: &str) -> Result<Self, MessagesError> {
        Self::from_tree(parse_yaml(src, "<string>")?)
    }

    pub fn from_json_str(src: &str) -> Result<Self, MessagesError> {
        Self::from_tree(parse_json(src, "<string>")?)
    }

    fn from_tree(tree: Value) -> Result<Self, MessagesError> {
        let mut entries = HashMap::new();
        for (locale, body) in locales(&tree)? {
            let errors = match body.get("errors") {
                Some(Value::Object(errors)) => errors,
                _ => body,
            };
            for (predicate, text) in errors {
                match text {
                    Value::String(text) => {
                        entries.insert((locale.clone(), predicate.clone()), text.clone());
                    }
                    _ => tracing::debug!(locale = %locale, predicate = %predicate, "Skipping non-string message"),
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, locale: &str, predicate: &str) -> Option<&str> {
        self.entries
            .get(&(locale.to_string(), predicate.to_string()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageCatalog for MessageFile {
    fn message(&self, locale: &str, predicate: &str) -> Option<String> {
        self.get(locale, predicate).map(str::to_string)
    }
}

// ---------------------------------------------------------------------------
// Shared parsing helpers
// ---------------------------------------------------------------------------

pub(crate) fn read_tree(path: &Path) -> Result<Value, MessagesError> {
    let origin = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let parse: fn(&str, &str) -> Result<Value, MessagesError> = match extension.as_deref() {
        Some("yml" | "yaml") => parse_yaml,
        Some("json") => parse_json,
        _ => return Err(MessagesError::UnsupportedFormat(path.to_path_buf())),
    };
    let src = std::fs::read_to_string(path).map_err(|source| MessagesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&src, &origin)
}

pub(crate) fn parse_yaml(src: &str, origin: &str) -> Result<Value, MessagesError> {
    serde_yaml::from_str(src).map_err(|source| MessagesError::Yaml {
        origin: origin.to_string(),
        source,
    })
}

pub(crate) fn parse_json(src: &str, origin: &str) -> Result<Value, MessagesError> {
    serde_json::from_str(src).map_err(|source| MessagesError::Json {
        origin: origin.to_string(),
        source,
    })
}

/// Top-level `locale -> object` pairs of a messages tree.
pub(crate) fn locales(tree: &Value) -> Result<Vec<(String, &Map<String, Value>)>, MessagesError> {
    let root = tree
        .as_object()
        .ok_or_else(|| MessagesError::InvalidShape("top level must map locales to messages".into()))?;
    root.iter()
        .map(|(locale, body)| {
            body.as_object()
                .map(|body| (locale.clone(), body))
                .ok_or_else(|| MessagesError::InvalidShape(format!("locale {locale} must be a mapping")))
        })
        .collect()
}
