//! Schema walker producing [`ValidationResult`]s.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::builtins::{HASH, KEY};
use crate::error::SchemaError;
use crate::expr::EvalContext;
use crate::messages::{display_value, resolve_message, Interpolations};
use crate::result::{FieldMessages, Messages, ValidationResult};
use crate::schema::{FieldRule, Presence, Schema};

/// Validates input records against a finalized [`Schema`].
///
/// A validator holds no mutable state; clones share the same schema and can
/// be used from several threads at once.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: Arc<Schema>,
}

impl Validator {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate using each schema node's configured locale.
    ///
    /// `Err` is only returned for configuration defects (a failing predicate
    /// with no message anywhere); invalid input is reported in the result.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<ValidationResult, SchemaError> {
        let messages = validate_node(&self.schema, input, None)?;
        Ok(ValidationResult::new(messages))
    }

    /// Validate with messages resolved in `locale` for every schema node.
    pub fn validate_in(
        &self,
        input: &Map<String, Value>,
        locale: &str,
    ) -> Result<ValidationResult, SchemaError> {
        let messages = validate_node(&self.schema, input, Some(locale))?;
        Ok(ValidationResult::new(messages))
    }
}

fn validate_node(
    schema: &Schema,
    input: &Map<String, Value>,
    locale: Option<&str>,
) -> Result<Messages, SchemaError> {
    let ctx = EvalContext {
        scope: schema.scope(),
        config: schema.config(),
        locale: locale.unwrap_or(schema.config().locale()),
    };
    let mut messages = Messages::default();

    for field in schema.fields() {
        let Some(value) = input.get(&field.name) else {
            if field.presence == Presence::Required {
                let text = builtin_message(&ctx, KEY, &Value::Null)?;
                messages.insert(field.name.as_str(), FieldMessages::List(vec![text]));
            }
            continue;
        };

        match &field.rule {
            FieldRule::Rule(expr) => {
                let outcome = expr.evaluate(value, &ctx)?;
                if !outcome.passed {
                    messages.insert(field.name.as_str(), FieldMessages::List(outcome.messages));
                }
            }
            FieldRule::Nested(nested) => match value.as_object() {
                Some(record) => {
                    let inner = validate_node(nested, record, locale)?;
                    if !inner.is_empty() {
                        messages.insert(field.name.as_str(), FieldMessages::Nested(inner));
                    }
                }
                None => {
                    let text = builtin_message(&ctx, HASH, value)?;
                    messages.insert(field.name.as_str(), FieldMessages::List(vec![text]));
                }
            },
        }
    }

    Ok(messages)
}

/// Message for one of the validator's implicit checks, resolved like any
/// other predicate so catalogs can override it.
fn builtin_message(ctx: &EvalContext<'_>, name: &str, value: &Value) -> Result<String, SchemaError> {
    let predicate = ctx.scope.resolve(name)?;
    let mut vars = Interpolations::new();
    vars.insert("value".to_string(), display_value(value));
    resolve_message(predicate, None, &vars, ctx.config, ctx.locale)
}
