//! Ready-made matcher handlers.
//!
//! Each function returns a closure with the matcher handler signature
//! `(fixture, matched, pattern) -> fixture`, ready to pass to
//! `register_rule`.

use serde_json::Value;

/// Returns a handler that sets `key` to `value` on object fixtures.
///
/// Non-object fixtures are returned unchanged.
///
/// # Examples
///
/// ```
/// use hazy_test::set_field;
/// use serde_json::json;
///
/// let handler = set_field("age", json!(99));
/// assert_eq!(handler(&json!({"age": 1}), &[], "$.age"), json!({"age": 99}));
/// ```
pub fn set_field(
    key: impl Into<String>,
    value: Value,
) -> impl Fn(&Value, &[Value], &str) -> Value + Send + Sync + 'static {
    let key = key.into();
    move |fixture: &Value, _: &[Value], _: &str| {
        let mut fixture = fixture.clone();
        if let Value::Object(map) = &mut fixture {
            map.insert(key.clone(), value.clone());
        }
        fixture
    }
}

/// Returns a handler that replaces every matching fixture with `value`.
pub fn replace_with(
    value: Value,
) -> impl Fn(&Value, &[Value], &str) -> Value + Send + Sync + 'static {
    move |_: &Value, _: &[Value], _: &str| value.clone()
}

/// Returns a handler that records the pattern and the matched values
/// under `key`, for asserting what a rule was called with.
pub fn tag_pattern(
    key: impl Into<String>,
) -> impl Fn(&Value, &[Value], &str) -> Value + Send + Sync + 'static {
    let key = key.into();
    move |fixture: &Value, matched: &[Value], pattern: &str| {
        let mut fixture = fixture.clone();
        if let Value::Object(map) = &mut fixture {
            map.insert(
                key.clone(),
                serde_json::json!({"pattern": pattern, "matched": matched}),
            );
        }
        fixture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_field_ignores_non_objects() {
        let handler = set_field("age", json!(99));
        assert_eq!(handler(&json!([1]), &[], "$[0]"), json!([1]));
    }

    #[test]
    fn test_replace_with() {
        let handler = replace_with(json!("gone"));
        assert_eq!(handler(&json!({"a": 1}), &[json!(1)], "$.a"), json!("gone"));
    }

    #[test]
    fn test_tag_pattern() {
        let handler = tag_pattern("_match");
        let tagged = handler(&json!({"a": 1}), &[json!(1)], "$.a");
        assert_eq!(tagged["_match"], json!({"pattern": "$.a", "matched": [1]}));
    }
}
