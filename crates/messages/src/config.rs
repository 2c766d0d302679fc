use std::path::PathBuf;
use std::sync::Arc;

use sieve_core::messages::DEFAULT_LOCALE;
use sieve_core::{MessageConfig, MessageMode};

use crate::error::MessagesError;
use crate::file::MessageFile;
use crate::i18n::I18nCatalog;

/// Message settings loaded from environment variables.
///
/// | Env Var               | Default  |
/// |-----------------------|----------|
/// | `SIEVE_MESSAGES_PATH` | unset    |
/// | `SIEVE_LOCALE`        | `en`     |
/// | `SIEVE_MESSAGES_MODE` | `static` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagesSettings {
    /// Messages file (static mode) or translations file (i18n mode).
    pub messages_path: Option<PathBuf>,
    pub locale: String,
    pub mode: MessageMode,
}

impl Default for MessagesSettings {
    fn default() -> Self {
        Self {
            messages_path: None,
            locale: DEFAULT_LOCALE.to_string(),
            mode: MessageMode::Static,
        }
    }
}

impl MessagesSettings {
    pub fn from_env() -> Result<Self, MessagesError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MessagesError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let messages_path = lookup("SIEVE_MESSAGES_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let locale = lookup("SIEVE_LOCALE")
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        let mode = match lookup("SIEVE_MESSAGES_MODE") {
            Some(raw) => raw.parse().map_err(|reason| MessagesError::InvalidEnv {
                name: "SIEVE_MESSAGES_MODE",
                reason,
            })?,
            None => MessageMode::Static,
        };

        Ok(Self {
            messages_path,
            locale,
            mode,
        })
    }

    /// Load the configured file and produce a schema message configuration.
    pub fn into_config(self) -> Result<MessageConfig, MessagesError> {
        let mut config = MessageConfig::default();
        config.set_locale(self.locale);

        match (self.mode, self.messages_path) {
            (MessageMode::Static, Some(path)) => {
                config.add_catalog(Arc::new(MessageFile::load(path)?));
            }
            (MessageMode::I18n, Some(path)) => {
                config.use_i18n(Arc::new(I18nCatalog::load(path)?));
            }
            (MessageMode::I18n, None) => {
                return Err(MessagesError::InvalidEnv {
                    name: "SIEVE_MESSAGES_PATH",
                    reason: "i18n mode needs a translations file".into(),
                });
            }
            (MessageMode::Static, None) => {}
        }

        Ok(config)
    }
}
