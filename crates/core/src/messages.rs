//! Message configuration and resolution.
//!
//! A failing predicate's text is taken from the first source that has one:
//!
//! 1. the inline message on the rule leaf
//! 2. the message registered with the predicate
//! 3. the configured message catalogs, keyed by `(locale, predicate)`
//! 4. the i18n backend under `errors.<predicate>` (i18n mode only)
//! 5. the predicate's built-in default template
//!
//! If none of them yields text the resolver returns
//! [`SchemaError::MissingMessage`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::SchemaError;
use crate::predicate::Predicate;

/// Default locale of a fresh [`MessageConfig`].
pub const DEFAULT_LOCALE: &str = "en";

/// Values substituted into `%{name}` placeholders.
pub type Interpolations = IndexMap<String, String>;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Static message source keyed by `(locale, predicate_name)`.
pub trait MessageCatalog: Send + Sync {
    fn message(&self, locale: &str, predicate: &str) -> Option<String>;
}

/// Translation backend used when a schema runs in [`MessageMode::I18n`].
pub trait I18nBackend: Send + Sync {
    fn lookup(&self, locale: &str, key: &str, interpolations: &Interpolations) -> Option<String>;
}

impl MessageCatalog for HashMap<(String, String), String> {
    fn message(&self, locale: &str, predicate: &str) -> Option<String> {
        self.get(&(locale.to_string(), predicate.to_string())).cloned()
    }
}

/// Conventional i18n key for a predicate's failure message.
pub fn i18n_key(predicate: &str) -> String {
    format!("errors.{predicate}")
}

// ---------------------------------------------------------------------------
// MessageConfig
// ---------------------------------------------------------------------------

/// Whether a schema reads static message sources or an i18n backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageMode {
    #[default]
    Static,
    I18n,
}

impl std::str::FromStr for MessageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "i18n" => Ok(Self::I18n),
            other => Err(format!("unknown message mode: {other}")),
        }
    }
}

/// Message settings attached to one schema node.
///
/// Nested schemas start from a copy of their parent's configuration.
#[derive(Clone)]
pub struct MessageConfig {
    locale: String,
    mode: MessageMode,
    catalogs: Vec<Arc<dyn MessageCatalog>>,
    i18n: Option<Arc<dyn I18nBackend>>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            mode: MessageMode::Static,
            catalogs: Vec::new(),
            i18n: None,
        }
    }
}

impl MessageConfig {
    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn mode(&self) -> MessageMode {
        self.mode
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) -> &mut Self {
        self.locale = locale.into();
        self
    }

    /// Append a static message catalog. Earlier catalogs take precedence.
    pub fn add_catalog(&mut self, catalog: Arc<dyn MessageCatalog>) -> &mut Self {
        self.catalogs.push(catalog);
        self
    }

    /// Switch to i18n-style messages backed by `backend`.
    pub fn use_i18n(&mut self, backend: Arc<dyn I18nBackend>) -> &mut Self {
        self.mode = MessageMode::I18n;
        self.i18n = Some(backend);
        self
    }

    /// Switch back to static message sources.
    pub fn use_static(&mut self) -> &mut Self {
        self.mode = MessageMode::Static;
        self
    }
}

impl fmt::Debug for MessageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageConfig")
            .field("locale", &self.locale)
            .field("mode", &self.mode)
            .field("catalogs", &self.catalogs.len())
            .field("i18n", &self.i18n.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the failure text for `predicate` in `locale`.
pub fn resolve_message(
    predicate: &Predicate,
    inline: Option<&str>,
    interpolations: &Interpolations,
    config: &MessageConfig,
    locale: &str,
) -> Result<String, SchemaError> {
    if let Some(text) = inline.or(predicate.registered_message()) {
        return Ok(interpolate(text, interpolations));
    }

    if let Some(text) = config
        .catalogs
        .iter()
        .find_map(|catalog| catalog.message(locale, predicate.name()))
    {
        return Ok(interpolate(&text, interpolations));
    }

    if config.mode == MessageMode::I18n {
        if let Some(text) = config
            .i18n
            .as_ref()
            .and_then(|backend| backend.lookup(locale, &i18n_key(predicate.name()), interpolations))
        {
            return Ok(text);
        }
    }

    if let Some(template) = predicate.default_template() {
        return Ok(interpolate(template, interpolations));
    }

    Err(SchemaError::MissingMessage {
        predicate: predicate.name().to_string(),
        locale: locale.to_string(),
    })
}

/// Replace `%{name}` placeholders; unknown names are left untouched.
pub fn interpolate(template: &str, interpolations: &Interpolations) -> String {
    if interpolations.is_empty() {
        return template.to_string();
    }
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            interpolations
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Human-readable form of an argument or input value inside a message.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
