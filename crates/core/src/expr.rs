//! Rule expressions: predicate leaves combined with OR / AND.
//!
//! An expression is immutable once built. It is checked against a scope when
//! its schema is finalized and resolved against that scope again on every
//! evaluation, so the same shape can bind different predicates in different
//! schema nodes.

use std::ops::{BitAnd, BitOr};

use serde_json::Value;

use crate::error::SchemaError;
use crate::messages::{display_value, resolve_message, Interpolations, MessageConfig};
use crate::predicate::Predicate;
use crate::scope::PredicateScope;

/// Connector used when a failing OR reports both sides.
pub const OR_CONNECTOR: &str = " or ";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A reference to a named predicate, with rule-site arguments and message.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub name: String,
    pub args: Vec<Value>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    Leaf(Leaf),
    Or(Box<RuleExpr>, Box<RuleExpr>),
    And(Box<RuleExpr>, Box<RuleExpr>),
}

/// Result of evaluating an expression against one value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub passed: bool,
    pub messages: Vec<String>,
}

/// What an evaluation resolves names and messages against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub scope: &'a PredicateScope,
    pub config: &'a MessageConfig,
    pub locale: &'a str,
}

/// Shorthand for a leaf expression without arguments.
pub fn pred(name: impl Into<String>) -> RuleExpr {
    RuleExpr::Leaf(Leaf::new(name))
}

// ---------------------------------------------------------------------------
// Leaf
// ---------------------------------------------------------------------------

impl Leaf {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            message: None,
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Inline message; beats every other message source.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn interpolations(&self, predicate: &Predicate, value: &Value) -> Interpolations {
        let mut vars: Interpolations = predicate
            .arg_names()
            .iter()
            .cloned()
            .zip(self.args.iter().map(display_value))
            .collect();
        vars.insert("value".to_string(), display_value(value));
        vars
    }

    fn verdict<'e>(&'e self, value: &Value, ctx: &EvalContext<'e>) -> Result<Verdict<'e>, SchemaError> {
        let predicate = ctx.scope.resolve(&self.name)?;
        let passed = predicate.call(value, &self.args);
        tracing::trace!(predicate = %self.name, passed, "Evaluated predicate");
        if passed {
            return Ok(Verdict::pass());
        }
        Ok(Verdict {
            passed: false,
            entries: vec![Entry::Single(Failure {
                leaf: self,
                predicate,
            })],
        })
    }

    fn failure_message(
        &self,
        predicate: &Predicate,
        value: &Value,
        ctx: &EvalContext<'_>,
    ) -> Result<String, SchemaError> {
        let vars = self.interpolations(predicate, value);
        resolve_message(predicate, self.message.as_deref(), &vars, ctx.config, ctx.locale)
    }
}

impl From<Leaf> for RuleExpr {
    fn from(leaf: Leaf) -> Self {
        RuleExpr::Leaf(leaf)
    }
}

// ---------------------------------------------------------------------------
// RuleExpr
// ---------------------------------------------------------------------------

impl RuleExpr {
    pub fn or(self, other: impl Into<RuleExpr>) -> Self {
        RuleExpr::Or(Box::new(self), Box::new(other.into()))
    }

    pub fn and(self, other: impl Into<RuleExpr>) -> Self {
        RuleExpr::And(Box::new(self), Box::new(other.into()))
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            RuleExpr::Leaf(leaf) => out.push(leaf),
            RuleExpr::Or(l, r) | RuleExpr::And(l, r) => {
                l.collect_leaves(out);
                r.collect_leaves(out);
            }
        }
    }

    /// Check that every leaf names a predicate visible in `scope` and passes
    /// it acceptable arguments.
    pub fn check(&self, scope: &PredicateScope) -> Result<(), SchemaError> {
        for leaf in self.leaves() {
            scope.resolve(&leaf.name)?.check_args(&leaf.args)?;
        }
        Ok(())
    }

    /// Evaluate both sides of every combinator and compose their messages.
    ///
    /// Messages are resolved only when the whole expression fails, so a
    /// failing side without any message does not matter when an enclosing
    /// OR passes.
    pub fn evaluate(&self, value: &Value, ctx: &EvalContext<'_>) -> Result<Outcome, SchemaError> {
        let verdict = self.verdict(value, ctx)?;
        if verdict.passed {
            return Ok(Outcome::pass());
        }
        let messages = verdict
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Single(failure) => failure.message(value, ctx),
                Entry::Joined(failures) => failures
                    .iter()
                    .map(|failure| failure.message(value, ctx))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|parts| parts.join(OR_CONNECTOR)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Outcome::fail(messages))
    }

    fn verdict<'e>(&'e self, value: &Value, ctx: &EvalContext<'e>) -> Result<Verdict<'e>, SchemaError> {
        match self {
            RuleExpr::Leaf(leaf) => leaf.verdict(value, ctx),
            RuleExpr::Or(l, r) => {
                let left = l.verdict(value, ctx)?;
                let right = r.verdict(value, ctx)?;
                if left.passed || right.passed {
                    return Ok(Verdict::pass());
                }
                let joined = left
                    .entries
                    .into_iter()
                    .chain(right.entries)
                    .flat_map(Entry::into_failures)
                    .collect();
                Ok(Verdict {
                    passed: false,
                    entries: vec![Entry::Joined(joined)],
                })
            }
            RuleExpr::And(l, r) => {
                let left = l.verdict(value, ctx)?;
                let right = r.verdict(value, ctx)?;
                if left.passed && right.passed {
                    return Ok(Verdict::pass());
                }
                let mut entries = left.entries;
                entries.extend(right.entries);
                Ok(Verdict {
                    passed: false,
                    entries,
                })
            }
        }
    }
}

impl BitOr for RuleExpr {
    type Output = RuleExpr;

    fn bitor(self, rhs: RuleExpr) -> RuleExpr {
        self.or(rhs)
    }
}

impl BitAnd for RuleExpr {
    type Output = RuleExpr;

    fn bitand(self, rhs: RuleExpr) -> RuleExpr {
        self.and(rhs)
    }
}

impl Outcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            messages: Vec::new(),
        }
    }

    pub fn fail(messages: Vec<String>) -> Self {
        Self {
            passed: false,
            messages,
        }
    }
}

// ---------------------------------------------------------------------------
// Unresolved failures
// ---------------------------------------------------------------------------

/// A failing leaf whose message has not been resolved yet.
struct Failure<'e> {
    leaf: &'e Leaf,
    predicate: &'e Predicate,
}

/// One future entry of a field's message list.
enum Entry<'e> {
    Single(Failure<'e>),
    /// Failures of an OR, reported as one message.
    Joined(Vec<Failure<'e>>),
}

struct Verdict<'e> {
    passed: bool,
    entries: Vec<Entry<'e>>,
}

impl Failure<'_> {
    fn message(&self, value: &Value, ctx: &EvalContext<'_>) -> Result<String, SchemaError> {
        self.leaf.failure_message(self.predicate, value, ctx)
    }
}

impl<'e> Entry<'e> {
    fn into_failures(self) -> Vec<Failure<'e>> {
        match self {
            Entry::Single(failure) => vec![failure],
            Entry::Joined(failures) => failures,
        }
    }
}

impl Verdict<'_> {
    fn pass() -> Self {
        Self {
            passed: true,
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::scope::ScopeBuilder;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn scope() -> PredicateScope {
        let mut builder = ScopeBuilder::new();
        builder
            .register(
                Predicate::new("url?", |v| v.as_str().is_some_and(|s| s.starts_with("http")))
                    .message("must be an URL"),
            )
            .unwrap();
        builder
            .register(
                Predicate::new("email?", |v| v.as_str().is_some_and(|s| s.contains('@')))
                    .message("must be an email"),
            )
            .unwrap();
        builder.finish(Some(PredicateScope::builtins()))
    }

    fn eval(expr: &RuleExpr, value: Value) -> Outcome {
        let scope = scope();
        let config = MessageConfig::default();
        let ctx = EvalContext {
            scope: &scope,
            config: &config,
            locale: "en",
        };
        expr.evaluate(&value, &ctx).unwrap()
    }

    #[test]
    fn leaf_agrees_with_predicate() {
        let scope = scope();
        for value in [json!("http://x"), json!("x"), json!(3), json!(null)] {
            let direct = scope.resolve("url?").unwrap().call(&value, &[]);
            assert_eq!(eval(&pred("url?"), value).passed, direct);
        }
    }

    #[test]
    fn or_passes_when_either_side_passes() {
        let expr = pred("url?") | pred("email?");
        assert_eq!(eval(&expr, json!("http://hanamirb.org")), Outcome::pass());
        assert_eq!(eval(&expr, json!("foo@mailinator.com")), Outcome::pass());
    }

    #[test]
    fn failing_or_joins_into_one_message() {
        let expr = pred("url?") | pred("email?");
        let outcome = eval(&expr, json!("test"));
        assert!(!outcome.passed);
        assert_eq!(outcome.messages, vec!["must be an URL or must be an email"]);
    }

    #[test]
    fn failing_and_reports_each_conjunct() {
        let expr = pred("url?") & pred("email?");
        let outcome = eval(&expr, json!("test"));
        assert_eq!(outcome.messages, vec!["must be an URL", "must be an email"]);
    }

    #[test]
    fn and_reports_only_failing_side() {
        let expr = pred("str?") & pred("email?");
        let outcome = eval(&expr, json!("test"));
        assert_eq!(outcome.messages, vec!["must be an email"]);
    }

    #[test]
    fn or_nested_in_and_contributes_one_entry() {
        let expr = pred("filled?") & (pred("url?") | pred("email?"));
        let outcome = eval(&expr, json!(""));
        assert_eq!(
            outcome.messages,
            vec!["must be filled", "must be an URL or must be an email"]
        );
    }

    #[test]
    fn and_nested_in_or_joins_every_message() {
        let expr = (pred("url?") & pred("email?")) | pred("int?");
        let outcome = eval(&expr, json!("test"));
        assert_eq!(
            outcome.messages,
            vec!["must be an URL or must be an email or must be an integer"]
        );
    }

    #[test]
    fn distinct_leaves_sharing_text_are_all_reported() {
        let expr = RuleExpr::from(Leaf::new("int?").message("is invalid"))
            .and(Leaf::new("gt?").arg(5).message("is invalid"));
        assert_eq!(eval(&expr, json!("x")).messages, vec!["is invalid", "is invalid"]);
    }

    #[test]
    fn each_failing_leaf_reports_once() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut builder = ScopeBuilder::new();
        builder
            .register(
                Predicate::new("tick?", move |_| {
                    counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    false
                })
                .message("ticked"),
            )
            .unwrap();
        let scope = builder.finish(Some(PredicateScope::builtins()));
        let config = MessageConfig::default();
        let ctx = EvalContext {
            scope: &scope,
            config: &config,
            locale: "en",
        };
        let expr = pred("tick?") & (pred("filled?") | pred("int?"));
        let outcome = expr.evaluate(&json!(""), &ctx).unwrap();
        assert_eq!(
            outcome.messages,
            vec!["ticked", "must be filled or must be an integer"]
        );
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn passing_or_ignores_side_without_message() {
        let mut builder = ScopeBuilder::new();
        builder
            .register(Predicate::new("bare?", |v| v.as_str() == Some("bare")))
            .unwrap();
        builder
            .register(
                Predicate::new("email?", |v| v.as_str().is_some_and(|s| s.contains('@')))
                    .message("must be an email"),
            )
            .unwrap();
        let scope = builder.finish(Some(PredicateScope::builtins()));
        let config = MessageConfig::default();
        let ctx = EvalContext {
            scope: &scope,
            config: &config,
            locale: "en",
        };
        let expr = pred("bare?") | pred("email?");

        assert_eq!(expr.evaluate(&json!("a@b.c"), &ctx).unwrap(), Outcome::pass());
        assert_matches!(
            expr.evaluate(&json!("nope"), &ctx),
            Err(SchemaError::MissingMessage { predicate, .. }) if predicate == "bare?"
        );
    }

    #[test]
    fn inline_message_and_arguments_are_used() {
        let expr: RuleExpr = Leaf::new("gt?").arg(18).into();
        assert_eq!(eval(&expr, json!(3)).messages, vec!["must be greater than 18"]);

        let expr: RuleExpr = Leaf::new("url?").message("give me a link").into();
        assert_eq!(eval(&expr, json!("x")).messages, vec!["give me a link"]);
    }

    #[test]
    fn both_sides_are_evaluated() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut builder = ScopeBuilder::new();
        builder
            .register(Predicate::new("count?", move |_| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                true
            }))
            .unwrap();
        let scope = builder.finish(Some(PredicateScope::builtins()));
        let config = MessageConfig::default();
        let ctx = EvalContext {
            scope: &scope,
            config: &config,
            locale: "en",
        };
        let expr = pred("filled?") | pred("count?");
        assert!(expr.evaluate(&json!("x"), &ctx).unwrap().passed);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn check_reports_unknown_and_bad_arguments() {
        let scope = scope();
        assert!((pred("url?") | pred("email?")).check(&scope).is_ok());
        assert_matches!(
            (pred("url?") & pred("phone?")).check(&scope),
            Err(SchemaError::UnknownPredicate { name }) if name == "phone?"
        );
        assert_matches!(
            pred("gt?").check(&scope),
            Err(SchemaError::InvalidArguments { .. })
        );
    }

    #[test]
    fn leaves_are_left_to_right() {
        let expr = pred("a?") & (pred("b?") | pred("c?"));
        let names: Vec<&str> = expr.leaves().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["a?", "b?", "c?"]);
    }
}
