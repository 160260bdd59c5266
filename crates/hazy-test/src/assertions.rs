//! Assertion helpers.

use std::fmt::Debug;

use hazy_core::{ErrorKind, HazyError};
use serde_json::Value;

/// Asserts that `result` failed with an error of `kind`.
///
/// # Panics
///
/// Panics if `result` is `Ok` or fails with a different kind.
#[track_caller]
pub fn assert_error_kind<T: Debug>(result: &Result<T, HazyError>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected a {kind} error, got Ok({value:?})"),
        Err(e) => assert_eq!(
            e.kind(),
            kind,
            "Expected a {kind} error, got {} error: {e}",
            e.kind()
        ),
    }
}

/// Asserts that `fixture` is an object holding every key in `keys`.
///
/// # Panics
///
/// Panics if `fixture` is not an object or a key is missing.
#[track_caller]
pub fn assert_has_keys(fixture: &Value, keys: &[&str]) {
    let Value::Object(map) = fixture else {
        panic!("Expected an object fixture, got {fixture}");
    };
    let missing: Vec<_> = keys.iter().filter(|key| !map.contains_key(**key)).collect();
    assert!(missing.is_empty(), "Fixture {fixture} is missing keys {missing:?}");
}

/// Asserts that two fixtures have the same structure: the same object keys
/// and array lengths, with leaves of the same JSON type.
///
/// Useful for fixtures with random leaves.
///
/// # Panics
///
/// Panics at the first structural difference.
#[track_caller]
pub fn assert_same_shape(actual: &Value, expected: &Value) {
    if let Err(path) = same_shape(actual, expected, "$") {
        panic!("Fixtures differ in shape at {path}:\n  actual: {actual}\n  expected: {expected}");
    }
}

fn same_shape(actual: &Value, expected: &Value, path: &str) -> Result<(), String> {
    match (actual, expected) {
        (Value::Object(a), Value::Object(b)) => {
            if a.len() != b.len() || a.keys().any(|key| !b.contains_key(key)) {
                return Err(path.to_string());
            }
            a.iter()
                .try_for_each(|(key, value)| same_shape(value, &b[key], &format!("{path}.{key}")))
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(path.to_string());
            }
            a.iter()
                .zip(b)
                .enumerate()
                .try_for_each(|(i, (x, y))| same_shape(x, y, &format!("{path}[{i}]")))
        }
        (Value::String(_), Value::String(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Null, Value::Null) => Ok(()),
        _ => Err(path.to_string()),
    }
}
