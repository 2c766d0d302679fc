//! Schema definition.
//!
//! A [`SchemaBuilder`] collects predicates, message settings and field rules
//! for one schema block. [`SchemaBuilder::build`] freezes it into an
//! immutable [`Schema`]: the scope is frozen first, every rule is checked
//! against it, and nested blocks are finalized with the frozen scope as
//! their parent. Unknown predicate names therefore fail here, before any
//! input is validated.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::SchemaError;
use crate::expr::RuleExpr;
use crate::messages::MessageConfig;
use crate::predicate::{Predicate, PredicateModule};
use crate::scope::{PredicateScope, ScopeBuilder};

type ConfigEdit = Box<dyn FnOnce(&mut MessageConfig)>;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug)]
pub enum FieldRule {
    Rule(RuleExpr),
    Nested(Schema),
}

#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub presence: Presence,
    pub rule: FieldRule,
}

/// A finalized schema node: ordered fields plus the scope and message
/// configuration their rules resolve against.
#[derive(Debug)]
pub struct Schema {
    scope: Arc<PredicateScope>,
    config: Arc<MessageConfig>,
    fields: Vec<Field>,
}

impl Schema {
    /// Build a top-level schema from a definition block.
    pub fn build<F>(define: F) -> Result<Schema, SchemaError>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<(), SchemaError>,
    {
        let mut builder = SchemaBuilder::new();
        define(&mut builder)?;
        builder.build()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn scope(&self) -> &PredicateScope {
        &self.scope
    }

    pub fn config(&self) -> &MessageConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// SchemaBuilder
// ---------------------------------------------------------------------------

enum PendingRule {
    Rule(RuleExpr),
    Nested(SchemaBuilder),
}

struct PendingField {
    name: String,
    presence: Presence,
    rule: PendingRule,
}

/// Mutable definition of one schema block.
#[derive(Default)]
pub struct SchemaBuilder {
    scope: ScopeBuilder,
    config_edits: Vec<ConfigEdit>,
    fields: Vec<PendingField>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust this block's message configuration.
    ///
    /// Edits apply on top of the configuration inherited from the enclosing
    /// schema (or the default one at the top level), in call order.
    pub fn configure<F>(&mut self, edit: F) -> &mut Self
    where
        F: FnOnce(&mut MessageConfig) + 'static,
    {
        self.config_edits.push(Box::new(edit));
        self
    }

    /// Register an inline custom predicate visible to this block and the
    /// blocks nested in it.
    pub fn predicate(&mut self, predicate: Predicate) -> Result<&mut Self, SchemaError> {
        self.scope.register(predicate)?;
        Ok(self)
    }

    /// Shorthand for a unary custom predicate with an optional message.
    pub fn register<F>(
        &mut self,
        name: &str,
        func: F,
        message: Option<&str>,
    ) -> Result<&mut Self, SchemaError>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let mut predicate = Predicate::new(name, func);
        if let Some(message) = message {
            predicate = predicate.message(message);
        }
        self.predicate(predicate)
    }

    /// Merge a predicate module, and its message catalog if it has one.
    pub fn predicates(&mut self, module: PredicateModule) -> &mut Self {
        self.scope.merge(&module);
        if let Some(catalog) = module.messages().cloned() {
            self.configure(move |config| {
                config.add_catalog(catalog);
            });
        }
        self
    }

    pub fn required(&mut self, name: &str, rule: impl Into<RuleExpr>) -> &mut Self {
        self.push_field(name, Presence::Required, PendingRule::Rule(rule.into()))
    }

    pub fn optional(&mut self, name: &str, rule: impl Into<RuleExpr>) -> &mut Self {
        self.push_field(name, Presence::Optional, PendingRule::Rule(rule.into()))
    }

    /// Declare a required field validated by a nested schema block.
    ///
    /// The block's scope sits on top of this block's scope as finalized by
    /// [`build`](Self::build), so it also sees predicates registered here
    /// after the nested block was declared.
    pub fn required_schema<F>(&mut self, name: &str, define: F) -> Result<&mut Self, SchemaError>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<(), SchemaError>,
    {
        self.nested(name, Presence::Required, define)
    }

    /// Declare an optional field validated by a nested schema block.
    pub fn optional_schema<F>(&mut self, name: &str, define: F) -> Result<&mut Self, SchemaError>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<(), SchemaError>,
    {
        self.nested(name, Presence::Optional, define)
    }

    fn nested<F>(&mut self, name: &str, presence: Presence, define: F) -> Result<&mut Self, SchemaError>
    where
        F: FnOnce(&mut SchemaBuilder) -> Result<(), SchemaError>,
    {
        let mut child = SchemaBuilder::new();
        define(&mut child)?;
        Ok(self.push_field(name, presence, PendingRule::Nested(child)))
    }

    fn push_field(&mut self, name: &str, presence: Presence, rule: PendingRule) -> &mut Self {
        let field = PendingField {
            name: name.to_string(),
            presence,
            rule,
        };
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                tracing::warn!(field = name, "Field redeclared, replacing earlier rule");
                *existing = field;
            }
            None => self.fields.push(field),
        }
        self
    }

    /// Finalize as a top-level schema over the built-in scope.
    pub fn build(self) -> Result<Schema, SchemaError> {
        self.finish(PredicateScope::builtins(), &MessageConfig::default())
    }

    fn finish(self, parent: Arc<PredicateScope>, inherited: &MessageConfig) -> Result<Schema, SchemaError> {
        let scope = Arc::new(self.scope.finish(Some(parent)));

        let mut config = inherited.clone();
        for edit in self.config_edits {
            edit(&mut config);
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for pending in self.fields {
            let rule = match pending.rule {
                PendingRule::Rule(expr) => {
                    expr.check(&scope)?;
                    FieldRule::Rule(expr)
                }
                PendingRule::Nested(child) => {
                    FieldRule::Nested(child.finish(Arc::clone(&scope), &config)?)
                }
            };
            fields.push(Field {
                name: pending.name,
                presence: pending.presence,
                rule,
            });
        }

        tracing::debug!(
            fields = fields.len(),
            locale = config.locale(),
            mode = ?config.mode(),
            "Schema finalized"
        );

        Ok(Schema {
            scope,
            config: Arc::new(config),
            fields,
        })
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("scope", &self.scope)
            .field("config_edits", &self.config_edits.len())
            .field(
                "fields",
                &self.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::pred;
    use assert_matches::assert_matches;

    fn email(v: &Value) -> bool {
        v.as_str().is_some_and(|s| s.contains('@'))
    }

    #[test]
    fn unknown_predicate_fails_construction() {
        let err = Schema::build(|s| {
            s.required("foo", pred("email?"));
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "+email?+ is not a valid predicate name");
    }

    #[test]
    fn predicates_may_be_registered_after_the_rules_using_them() {
        let schema = Schema::build(|s| {
            s.required("foo", pred("email?"));
            s.register("email?", email, Some("must be an email"))?;
            Ok(())
        });
        assert!(schema.is_ok());
    }

    #[test]
    fn nested_predicates_are_invisible_to_the_parent() {
        let err = Schema::build(|s| {
            s.required_schema("details", |d| {
                d.register("odd_custom?", |_| true, None)?;
                d.required("foo", pred("odd_custom?"));
                Ok(())
            })?;
            s.required("bar", pred("odd_custom?"));
            Ok(())
        })
        .unwrap_err();
        assert_matches!(err, SchemaError::UnknownPredicate { name } if name == "odd_custom?");
    }

    #[test]
    fn nested_scope_sees_parent_predicates() {
        let schema = Schema::build(|s| {
            s.register("email?", email, Some("must be an email"))?;
            s.required_schema("contact", |c| {
                c.required("address", pred("email?"));
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        let Some(FieldRule::Nested(contact)) = schema.field("contact").map(|f| &f.rule) else {
            panic!("contact should be nested");
        };
        assert!(contact.scope().resolve("email?").is_ok());
        assert!(!contact.scope().defines("email?"));
    }

    #[test]
    fn nested_scope_sees_parent_predicates_registered_later() {
        let schema = Schema::build(|s| {
            s.optional_schema("contact", |c| {
                c.required("address", pred("email?"));
                Ok(())
            })?;
            s.register("email?", email, Some("must be an email"))?;
            Ok(())
        })
        .unwrap();
        let Some(FieldRule::Nested(contact)) = schema.field("contact").map(|f| &f.rule) else {
            panic!("contact should be nested");
        };
        assert_eq!(schema.field("contact").unwrap().presence, Presence::Optional);
        assert!(contact.scope().resolve("email?").is_ok());
    }

    #[test]
    fn nested_config_inherits_and_extends() {
        let schema = Schema::build(|s| {
            s.configure(|c| {
                c.set_locale("it");
            });
            s.required_schema("details", |d| {
                d.configure(|c| {
                    c.set_locale("de");
                });
                d.required("foo", pred("filled?"));
                Ok(())
            })?;
            s.required_schema("other", |d| {
                d.required("foo", pred("filled?"));
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(schema.config().locale(), "it");
        let locale_of = |name: &str| match &schema.field(name).unwrap().rule {
            FieldRule::Nested(n) => n.config().locale().to_string(),
            FieldRule::Rule(_) => unreachable!(),
        };
        assert_eq!(locale_of("details"), "de");
        assert_eq!(locale_of("other"), "it");
    }

    #[test]
    fn duplicate_inline_predicate_fails_construction() {
        let err = Schema::build(|s| {
            s.register("url?", |_| true, None)?;
            s.register("url?", |_| false, None)?;
            Ok(())
        })
        .unwrap_err();
        assert_matches!(err, SchemaError::DuplicateRegistration { .. });
    }

    #[test]
    fn fields_keep_declaration_order_and_redeclaration_replaces() {
        let schema = Schema::build(|s| {
            s.required("b", pred("filled?"));
            s.optional("a", pred("str?"));
            s.required("b", pred("int?"));
            Ok(())
        })
        .unwrap();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_matches!(&schema.fields()[0].rule, FieldRule::Rule(expr) if *expr == pred("int?"));
        assert_eq!(schema.fields()[1].presence, Presence::Optional);
    }
}
