//! In-memory i18n catalog.
//!
//! Translations are nested per locale and addressed by dotted keys, so
//! `en.errors.url?` in the file answers `lookup("en", "errors.url?", ..)`.
//! Lookups that miss in the requested locale retry in the fallback locale
//! when one is set.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use sieve_core::messages::interpolate;
use sieve_core::{I18nBackend, Interpolations};

use crate::error::MessagesError;
use crate::file::{locales, parse_json, parse_yaml, read_tree};

#[derive(Debug, Clone, Default)]
pub struct I18nCatalog {
    translations: HashMap<String, HashMap<String, String>>,
    fallback: Option<String>,
}

impl I18nCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MessagesError> {
        let path = path.as_ref();
        let catalog = Self::from_tree(read_tree(path)?)?;
        tracing::debug!(
            path = %path.display(),
            locales = catalog.translations.len(),
            "Loaded i18n catalog"
        );
        Ok(catalog)
    }

    pub fn from_yaml_str(src: &str) -> Result<Self, MessagesError> {
        Self::from_tree(parse_yaml(src, "<string>")?)
    }

    pub fn from_json_str(src: &str) -> Result<Self, MessagesError> {
        Self::from_tree(parse_json(src, "<string>")?)
    }

    fn from_tree(tree: Value) -> Result<Self, MessagesError> {
        let mut translations = HashMap::new();
        for (locale, body) in locales(&tree)? {
            let mut flat = HashMap::new();
            flatten("", body, &mut flat);
            translations.insert(locale, flat);
        }
        Ok(Self {
            translations,
            fallback: None,
        })
    }

    /// Locale to retry when a key is missing in the requested one.
    pub fn with_fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback = Some(locale.into());
        self
    }

    /// Add or replace a single translation.
    pub fn insert(&mut self, locale: &str, key: &str, template: impl Into<String>) {
        self.translations
            .entry(locale.to_string())
            .or_default()
            .insert(key.to_string(), template.into());
    }

    fn template(&self, locale: &str, key: &str) -> Option<&str> {
        self.translations
            .get(locale)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }
}

impl I18nBackend for I18nCatalog {
    fn lookup(&self, locale: &str, key: &str, interpolations: &Interpolations) -> Option<String> {
        let template = self.template(locale, key).or_else(|| {
            self.fallback
                .as_deref()
                .filter(|fallback| *fallback != locale)
                .and_then(|fallback| self.template(fallback, key))
        })?;
        Some(interpolate(template, interpolations))
    }
}

fn flatten(prefix: &str, node: &Map<String, Value>, out: &mut HashMap<String, String>) {
    for (key, value) in node {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::String(text) => {
                out.insert(path, text.clone());
            }
            Value::Object(child) => flatten(&path, child, out),
            _ => {}
        }
    }
}
