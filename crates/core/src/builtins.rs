//! Built-in predicate table loaded into the root scope.
//!
//! Every predicate returns `false` for input of the wrong type instead of
//! failing. Default messages are plain templates; catalogs may override them.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::predicate::Predicate;

/// Presence predicate used by the validator for required-but-absent keys.
pub const KEY: &str = "key?";
/// Type guard implied by a nested schema field.
pub const HASH: &str = "hash?";

/// `format?` patterns, compiled once when a schema using them is built.
static PATTERNS: Lazy<RwLock<HashMap<String, Regex>>> = Lazy::new(Default::default);

pub(crate) fn predicates() -> Vec<Predicate> {
    vec![
        // Presence / type checks
        Predicate::new(KEY, |_| true).default_message("is missing"),
        Predicate::new("filled?", is_filled).default_message("must be filled"),
        Predicate::new("empty?", is_empty).default_message("must be empty"),
        Predicate::new("none?", Value::is_null).default_message("cannot be defined"),
        Predicate::new("str?", Value::is_string).default_message("must be a string"),
        Predicate::new("int?", |v| v.is_i64() || v.is_u64()).default_message("must be an integer"),
        Predicate::new("float?", Value::is_f64).default_message("must be a float"),
        Predicate::new("number?", Value::is_number).default_message("must be a number"),
        Predicate::new("bool?", Value::is_boolean).default_message("must be boolean"),
        Predicate::new("array?", Value::is_array).default_message("must be an array"),
        Predicate::new(HASH, Value::is_object).default_message("must be a hash"),
        // Equality / inclusion
        Predicate::with_args("eql?", &["left"], |v, args| args.first() == Some(v))
            .default_message("must be equal to %{left}"),
        Predicate::with_args("not_eql?", &["left"], |v, args| args.first() != Some(v))
            .default_message("must not be equal to %{left}"),
        Predicate::with_args("included_in?", &["list"], |v, args| list_contains(args, v))
            .default_message("must be one of: %{list}")
            .args_check(expect_list),
        Predicate::with_args("excluded_from?", &["list"], |v, args| !list_contains(args, v))
            .default_message("must not be one of: %{list}")
            .args_check(expect_list),
        Predicate::new("true?", |v| v.as_bool() == Some(true)).default_message("must be true"),
        Predicate::new("false?", |v| v.as_bool() == Some(false)).default_message("must be false"),
        // Format
        Predicate::with_args("format?", &["regex"], matches_format)
            .default_message("is in invalid format")
            .args_check(expect_regex),
        // Numeric
        Predicate::with_args("gt?", &["num"], |v, args| compare(v, args, Ordering::is_gt))
            .default_message("must be greater than %{num}")
            .args_check(expect_number),
        Predicate::with_args("gteq?", &["num"], |v, args| compare(v, args, Ordering::is_ge))
            .default_message("must be greater than or equal to %{num}")
            .args_check(expect_number),
        Predicate::with_args("lt?", &["num"], |v, args| compare(v, args, Ordering::is_lt))
            .default_message("must be less than %{num}")
            .args_check(expect_number),
        Predicate::with_args("lteq?", &["num"], |v, args| compare(v, args, Ordering::is_le))
            .default_message("must be less than or equal to %{num}")
            .args_check(expect_number),
        Predicate::new("odd?", |v| integer(v).is_some_and(|n| n % 2 != 0))
            .default_message("must be odd"),
        Predicate::new("even?", |v| integer(v).is_some_and(|n| n % 2 == 0))
            .default_message("must be even"),
        // Size
        Predicate::with_args("size?", &["size"], |v, args| {
            size_cmp(v, args, |size, n| size == n)
        })
        .default_message("size must be %{size}")
        .args_check(expect_size),
        Predicate::with_args("min_size?", &["num"], |v, args| {
            size_cmp(v, args, |size, n| size >= n)
        })
        .default_message("size cannot be less than %{num}")
        .args_check(expect_size),
        Predicate::with_args("max_size?", &["num"], |v, args| {
            size_cmp(v, args, |size, n| size <= n)
        })
        .default_message("size cannot be greater than %{num}")
        .args_check(expect_size),
    ]
}

// ---------------------------------------------------------------------------
// Predicate bodies
// ---------------------------------------------------------------------------

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn list_contains(args: &[Value], value: &Value) -> bool {
    args.first()
        .and_then(Value::as_array)
        .is_some_and(|list| list.contains(value))
}

fn matches_format(value: &Value, args: &[Value]) -> bool {
    let (Some(input), Some(pattern)) = (value.as_str(), args.first().and_then(Value::as_str))
    else {
        return false;
    };
    compiled(pattern).is_ok_and(|re| re.is_match(input))
}

/// Compiled form of `pattern`, cached for the life of the process.
fn compiled(pattern: &str) -> Result<Regex, regex::Error> {
    if let Some(re) = PATTERNS
        .read()
        .ok()
        .and_then(|cache| cache.get(pattern).cloned())
    {
        return Ok(re);
    }
    let re = Regex::new(pattern)?;
    if let Ok(mut cache) = PATTERNS.write() {
        cache.insert(pattern.to_string(), re.clone());
    }
    Ok(re)
}

fn compare(value: &Value, args: &[Value], accept: fn(Ordering) -> bool) -> bool {
    let (Value::Number(a), Some(Value::Number(b))) = (value, args.first()) else {
        return false;
    };
    number_cmp(a, b).is_some_and(accept)
}

/// Exact for integers of any JSON width; floats compare as `f64`.
fn number_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    match (number_int(a), number_int(b)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn number_int(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => number_int(n),
        _ => None,
    }
}

fn size_of(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => Some(s.chars().count() as u64),
        Value::Array(a) => Some(a.len() as u64),
        Value::Object(o) => Some(o.len() as u64),
        _ => None,
    }
}

fn size_cmp(value: &Value, args: &[Value], op: fn(u64, u64) -> bool) -> bool {
    match (size_of(value), args.first().and_then(Value::as_u64)) {
        (Some(size), Some(n)) => op(size, n),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Argument checks
// ---------------------------------------------------------------------------

fn expect_list(args: &[Value]) -> Result<(), String> {
    if args[0].is_array() {
        Ok(())
    } else {
        Err(format!("expected an array, got {}", args[0]))
    }
}

fn expect_regex(args: &[Value]) -> Result<(), String> {
    let pattern = args[0]
        .as_str()
        .ok_or_else(|| format!("expected a pattern string, got {}", args[0]))?;
    compiled(pattern).map(|_| ()).map_err(|e| e.to_string())
}

fn expect_number(args: &[Value]) -> Result<(), String> {
    if args[0].is_number() {
        Ok(())
    } else {
        Err(format!("expected a number, got {}", args[0]))
    }
}

fn expect_size(args: &[Value]) -> Result<(), String> {
    if args[0].is_u64() {
        Ok(())
    } else {
        Err(format!("expected a non-negative integer, got {}", args[0]))
    }
}
