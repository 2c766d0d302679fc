//! Message sources for sieve schemas.
//!
//! - [`MessageFile`]: static `(locale, predicate) -> message` files in YAML
//!   or JSON, usable as a [`MessageCatalog`](sieve_core::MessageCatalog).
//! - [`I18nCatalog`]: dotted-key translations with `%{name}` interpolation,
//!   usable as an [`I18nBackend`](sieve_core::I18nBackend).
//! - [`MessagesSettings`]: environment-driven selection of the above.

pub mod config;
pub mod error;
pub mod file;
pub mod i18n;

pub use config::MessagesSettings;
pub use error::MessagesError;
pub use file::MessageFile;
pub use i18n::I18nCatalog;
