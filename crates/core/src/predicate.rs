//! Named predicates and predicate modules.
//!
//! A [`Predicate`] is a pure boolean test over a single JSON value, plus the
//! metadata the message resolver needs when it fails. A [`PredicateModule`]
//! is a plain bundle of predicates (optionally with its own message catalog)
//! that a schema merges into its scope.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{RegistrationSource, SchemaError};
use crate::messages::MessageCatalog;

/// Predicate body: the input value and the arguments declared at the rule site.
pub type PredicateFn = Arc<dyn Fn(&Value, &[Value]) -> bool + Send + Sync>;

/// Extra construction-time check over a leaf's arguments (after arity).
pub type ArgsCheck = fn(&[Value]) -> Result<(), String>;

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// A named boolean test with its failure messages.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    arg_names: Vec<String>,
    func: PredicateFn,
    message: Option<String>,
    default_message: Option<String>,
    args_check: Option<ArgsCheck>,
}

impl Predicate {
    /// Create a predicate that takes no arguments.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arg_names: Vec::new(),
            func: Arc::new(move |value, _args| func(value)),
            message: None,
            default_message: None,
            args_check: None,
        }
    }

    /// Create a predicate with named arguments, e.g. `gt?(num)`.
    ///
    /// Argument names double as interpolation keys in message templates
    /// (`"must be greater than %{num}"`).
    pub fn with_args<F>(name: impl Into<String>, arg_names: &[&str], func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arg_names: arg_names.iter().map(|s| s.to_string()).collect(),
            func: Arc::new(func),
            message: None,
            default_message: None,
            args_check: None,
        }
    }

    /// Attach the custom message registered alongside the predicate.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the lowest-precedence default message template.
    pub fn default_message(mut self, template: impl Into<String>) -> Self {
        self.default_message = Some(template.into());
        self
    }

    pub(crate) fn args_check(mut self, check: ArgsCheck) -> Self {
        self.args_check = Some(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_names(&self) -> &[String] {
        &self.arg_names
    }

    /// Message registered with the predicate, if any.
    pub fn registered_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn default_template(&self) -> Option<&str> {
        self.default_message.as_deref()
    }

    /// Run the predicate body. Panics inside the body propagate unchanged.
    pub fn call(&self, value: &Value, args: &[Value]) -> bool {
        (self.func)(value, args)
    }

    /// Validate the arguments a rule leaf supplies for this predicate.
    pub fn check_args(&self, args: &[Value]) -> Result<(), SchemaError> {
        if args.len() != self.arg_names.len() {
            return Err(SchemaError::InvalidArguments {
                predicate: self.name.clone(),
                reason: format!(
                    "expected {} argument(s), got {}",
                    self.arg_names.len(),
                    args.len()
                ),
            });
        }
        if let Some(check) = self.args_check {
            check(args).map_err(|reason| SchemaError::InvalidArguments {
                predicate: self.name.clone(),
                reason,
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("arg_names", &self.arg_names)
            .field("message", &self.message)
            .field("default_message", &self.default_message)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PredicateModule
// ---------------------------------------------------------------------------

/// A reusable bundle of predicates merged into a schema scope.
///
/// The module may carry its own message catalog (its messages file); merging
/// the module appends that catalog to the schema's message configuration.
#[derive(Clone)]
pub struct PredicateModule {
    name: String,
    predicates: IndexMap<String, Predicate>,
    messages: Option<Arc<dyn MessageCatalog>>,
}

impl PredicateModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicates: IndexMap::new(),
            messages: None,
        }
    }

    /// Add a predicate to the module.
    ///
    /// Registering the same name twice in one module is rejected.
    pub fn register(&mut self, predicate: Predicate) -> Result<&mut Self, SchemaError> {
        if self.predicates.contains_key(predicate.name()) {
            return Err(SchemaError::DuplicateRegistration {
                name: predicate.name().to_string(),
                origin: RegistrationSource::Module,
            });
        }
        self.predicates
            .insert(predicate.name().to_string(), predicate);
        Ok(self)
    }

    /// Attach the module's own message catalog.
    pub fn with_messages(mut self, catalog: Arc<dyn MessageCatalog>) -> Self {
        self.messages = Some(catalog);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.values()
    }

    pub fn messages(&self) -> Option<&Arc<dyn MessageCatalog>> {
        self.messages.as_ref()
    }
}

impl fmt::Debug for PredicateModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateModule")
            .field("name", &self.name)
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .field("has_messages", &self.messages.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn email() -> Predicate {
        Predicate::new("email?", |v| v.as_str().is_some_and(|s| s.contains('@')))
    }

    #[test]
    fn unary_predicate_ignores_args() {
        let p = email();
        assert!(p.call(&json!("a@b.c"), &[]));
        assert!(!p.call(&json!("abc"), &[]));
        assert!(!p.call(&json!(42), &[]));
    }

    #[test]
    fn check_args_rejects_wrong_arity() {
        let p = Predicate::with_args("gt?", &["num"], |_, _| true);
        assert!(p.check_args(&[json!(1)]).is_ok());
        assert_matches!(
            p.check_args(&[]),
            Err(SchemaError::InvalidArguments { predicate, .. }) if predicate == "gt?"
        );
    }

    #[test]
    fn check_args_runs_custom_check() {
        let p = Predicate::with_args("list?", &["list"], |_, _| true).args_check(|args| {
            if args[0].is_array() {
                Ok(())
            } else {
                Err("list must be an array".into())
            }
        });
        assert!(p.check_args(&[json!([1, 2])]).is_ok());
        assert!(p.check_args(&[json!("nope")]).is_err());
    }

    #[test]
    fn module_rejects_duplicate_names() {
        let mut module = PredicateModule::new("contact");
        module.register(email()).unwrap();
        assert_matches!(
            module.register(email()),
            Err(SchemaError::DuplicateRegistration {
                origin: RegistrationSource::Module,
                ..
            })
        );
    }

    #[test]
    fn registered_message_is_kept() {
        let p = email().message("must be an email");
        assert_eq!(p.registered_message(), Some("must be an email"));
        assert_eq!(p.default_template(), None);
    }
}
