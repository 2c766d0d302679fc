//! Sieve declarative validation engine.
//!
//! This crate provides the predicate/rule engine:
//!
//! - [`Predicate`] / [`PredicateModule`]: named boolean tests and reusable
//!   bundles of them.
//! - [`PredicateScope`]: layered name resolution from a schema block up to
//!   the built-in predicates.
//! - [`RuleExpr`]: OR / AND trees over predicate references, with
//!   deterministic message composition.
//! - [`MessageConfig`] and [`resolve_message`]: multi-source message lookup
//!   (inline, registered, catalog, i18n, default).
//! - [`Schema`] / [`Validator`]: schema definition and the walker producing
//!   a [`ValidationResult`].
//!
//! ```
//! use sieve_core::{pred, Schema, Validator};
//! use serde_json::json;
//!
//! let schema = Schema::build(|s| {
//!     s.register("url?", |v| v.as_str().is_some_and(|s| s.starts_with("http")), Some("must be an URL"))?;
//!     s.register("email?", |v| v.as_str().is_some_and(|s| s.contains('@')), Some("must be an email"))?;
//!     s.required("foo", pred("url?") | pred("email?"));
//!     Ok(())
//! })
//! .unwrap();
//!
//! let input = json!({"foo": "test"});
//! let result = Validator::new(schema).validate(input.as_object().unwrap()).unwrap();
//! assert!(!result.success());
//! assert_eq!(result.messages_at(&["foo"]).unwrap(), ["must be an URL or must be an email"]);
//! ```

pub mod builtins;
pub mod error;
pub mod expr;
pub mod messages;
pub mod predicate;
pub mod result;
pub mod schema;
pub mod scope;
pub mod validator;

pub use error::{RegistrationSource, SchemaError};
pub use expr::{pred, EvalContext, Leaf, Outcome, RuleExpr};
pub use messages::{
    resolve_message, I18nBackend, Interpolations, MessageCatalog, MessageConfig, MessageMode,
};
pub use predicate::{Predicate, PredicateModule};
pub use result::{FieldMessages, Messages, ValidationResult};
pub use schema::{Field, FieldRule, Presence, Schema, SchemaBuilder};
pub use scope::{PredicateScope, ScopeBuilder};
pub use validator::Validator;
