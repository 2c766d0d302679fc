//! Layered predicate scopes.
//!
//! Every scope holds a local name → predicate map and an optional read-only
//! parent. Lookup walks local first, then the parent chain up to the
//! built-in root. A child never mutates what its ancestors see.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::builtins;
use crate::error::{RegistrationSource, SchemaError};
use crate::predicate::{Predicate, PredicateModule};

static BUILTINS: Lazy<Arc<PredicateScope>> = Lazy::new(|| {
    let mut builder = ScopeBuilder::new();
    for predicate in builtins::predicates() {
        builder.insert(predicate, RegistrationSource::Builtin);
    }
    Arc::new(builder.finish(None))
});

// ---------------------------------------------------------------------------
// PredicateScope
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PredicateScope {
    parent: Option<Arc<PredicateScope>>,
    local: HashMap<String, Predicate>,
}

impl PredicateScope {
    /// The shared root scope holding the built-in predicates.
    pub fn builtins() -> Arc<PredicateScope> {
        Arc::clone(&BUILTINS)
    }

    /// Resolve a name through the local layer and then the parent chain.
    pub fn resolve(&self, name: &str) -> Result<&Predicate, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::UnknownPredicate {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        let mut scope = self;
        loop {
            if let Some(predicate) = scope.local.get(name) {
                return Some(predicate);
            }
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return None,
            }
        }
    }

    /// Whether `name` is defined in this scope's own layer.
    pub fn defines(&self, name: &str) -> bool {
        self.local.contains_key(name)
    }

    pub fn parent(&self) -> Option<&Arc<PredicateScope>> {
        self.parent.as_ref()
    }
}

// ---------------------------------------------------------------------------
// ScopeBuilder
// ---------------------------------------------------------------------------

/// Mutable staging area for a scope's local layer.
///
/// The parent is only attached in [`finish`](ScopeBuilder::finish), so a
/// nested schema can collect its predicates before the enclosing scope is
/// frozen.
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    local: HashMap<String, Predicate>,
    inline_names: HashSet<String>,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inline predicate.
    ///
    /// A second inline registration of the same name is a duplicate; an
    /// inline registration over a module predicate shadows it.
    pub fn register(&mut self, predicate: Predicate) -> Result<(), SchemaError> {
        if !self.inline_names.insert(predicate.name().to_string()) {
            return Err(SchemaError::DuplicateRegistration {
                name: predicate.name().to_string(),
                origin: RegistrationSource::Inline,
            });
        }
        self.insert(predicate, RegistrationSource::Inline);
        Ok(())
    }

    /// Merge every predicate of a module; later registrations win.
    pub fn merge(&mut self, module: &PredicateModule) {
        tracing::debug!(module = module.name(), "Merging predicate module");
        for predicate in module.predicates() {
            self.insert(predicate.clone(), RegistrationSource::Module);
        }
    }

    fn insert(&mut self, predicate: Predicate, origin: RegistrationSource) {
        let name = predicate.name().to_string();
        if self.local.insert(name.clone(), predicate).is_some() {
            tracing::debug!(predicate = %name, %origin, "Predicate shadowed within scope");
        } else if origin != RegistrationSource::Builtin {
            tracing::debug!(predicate = %name, %origin, "Predicate registered");
        }
    }

    pub fn finish(self, parent: Option<Arc<PredicateScope>>) -> PredicateScope {
        PredicateScope {
            parent,
            local: self.local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn starts_with(name: &str, prefix: &'static str) -> Predicate {
        Predicate::new(name, move |v| v.as_str().is_some_and(|s| s.starts_with(prefix)))
    }

    #[test]
    fn builtins_are_visible_from_children() {
        let child = ScopeBuilder::new().finish(Some(PredicateScope::builtins()));
        assert!(child.resolve("filled?").is_ok());
        assert!(!child.defines("filled?"));
    }

    #[test]
    fn unknown_name_carries_the_name() {
        let child = ScopeBuilder::new().finish(Some(PredicateScope::builtins()));
        assert_matches!(
            child.resolve("email?"),
            Err(SchemaError::UnknownPredicate { name }) if name == "email?"
        );
    }

    #[test]
    fn local_registration_shadows_parent_without_mutating_it() {
        let mut parent = ScopeBuilder::new();
        parent.register(starts_with("url?", "http")).unwrap();
        let parent = Arc::new(parent.finish(Some(PredicateScope::builtins())));

        let mut child = ScopeBuilder::new();
        child.register(starts_with("url?", "ftp")).unwrap();
        let child = child.finish(Some(Arc::clone(&parent)));

        let value = json!("ftp://example.org");
        assert!(child.resolve("url?").unwrap().call(&value, &[]));
        assert!(!parent.resolve("url?").unwrap().call(&value, &[]));
    }

    #[test]
    fn child_definitions_do_not_leak_upward() {
        let parent = Arc::new(ScopeBuilder::new().finish(Some(PredicateScope::builtins())));
        let mut child = ScopeBuilder::new();
        child.register(starts_with("odd_name?", "x")).unwrap();
        let child = child.finish(Some(Arc::clone(&parent)));

        assert!(child.resolve("odd_name?").is_ok());
        assert!(parent.resolve("odd_name?").is_err());
    }

    #[test]
    fn duplicate_inline_registration_fails() {
        let mut builder = ScopeBuilder::new();
        builder.register(starts_with("url?", "http")).unwrap();
        assert_matches!(
            builder.register(starts_with("url?", "https")),
            Err(SchemaError::DuplicateRegistration {
                origin: RegistrationSource::Inline,
                ..
            })
        );
    }

    #[test]
    fn module_then_inline_and_inline_then_module_both_compose() {
        let mut module = PredicateModule::new("web");
        module.register(starts_with("url?", "ftp")).unwrap();

        let mut module_first = ScopeBuilder::new();
        module_first.merge(&module);
        module_first.register(starts_with("url?", "http")).unwrap();
        let scope = module_first.finish(None);
        assert!(scope.resolve("url?").unwrap().call(&json!("http://a"), &[]));

        let mut inline_first = ScopeBuilder::new();
        inline_first.register(starts_with("url?", "http")).unwrap();
        inline_first.merge(&module);
        let scope = inline_first.finish(None);
        assert!(scope.resolve("url?").unwrap().call(&json!("ftp://a"), &[]));
    }
}
