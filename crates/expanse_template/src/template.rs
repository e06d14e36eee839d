//! Template string parsing and resolution.
//!
//! Manifest strings may embed `${path}` expressions. A string that consists of
//! exactly one expression is a *reference* and resolves to the raw typed
//! value; any other string containing expressions is *interpolated* into a
//! new string.
//!
//! # Example
//!
//! ```
//! use expanse_template::{Scope, resolve};
//! use serde_json::json;
//!
//! let context = json!({ "name": "Ana", "tags": ["a", "b"] });
//! let state = json!({});
//! let env = json!({});
//! let scope = Scope::new(&context, &state, &env);
//!
//! assert_eq!(*resolve(&json!("Hi ${context.name}!"), &scope), json!("Hi Ana!"));
//! assert_eq!(*resolve(&json!("${context.tags}"), &scope), json!(["a", "b"]));
//! assert_eq!(*resolve(&json!("Hi ${context.missing}!"), &scope), json!("Hi !"));
//! ```

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::path::Path;
use crate::scope::Scope;

const OPEN: &str = "${";
const CLOSE: char = '}';

/// One piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text copied verbatim.
    Text(String),
    /// An expression replaced by its stringified value.
    Expr(Path),
}

/// A parsed template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// No expressions; the string is used as-is.
    Literal,
    /// The whole string is one expression; resolves to the raw value.
    Reference(Path),
    /// Text mixed with expressions; resolves to a string.
    Interpolated(Vec<Segment>),
}

impl Template {
    /// Parses a template string.
    ///
    /// An `${` without a closing brace is kept as literal text.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        if !source.contains(OPEN) {
            return Self::Literal;
        }

        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(start) = rest.find(OPEN) {
            let after = &rest[start + OPEN.len()..];
            let Some(end) = after.find(CLOSE) else {
                break;
            };
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            segments.push(Segment::Expr(Path::parse(&after[..end])));
            rest = &after[end + CLOSE.len_utf8()..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        match segments.as_slice() {
            [Segment::Expr(path)] => Self::Reference(path.clone()),
            _ if segments.iter().any(|s| matches!(s, Segment::Expr(_))) => {
                Self::Interpolated(segments)
            }
            _ => Self::Literal,
        }
    }
}

/// Returns `true` if the string contains at least one complete expression.
#[must_use]
pub fn is_template(source: &str) -> bool {
    !matches!(Template::parse(source), Template::Literal)
}

/// Resolves a manifest value against a scope.
///
/// Non-string scalars are returned unchanged; arrays and objects are resolved
/// element-wise. Resolution never fails: missing references become `null`,
/// and missing interpolations become empty text.
///
/// Values that contain no expressions are borrowed rather than copied, and a
/// pure reference borrows the referenced value from the scope.
#[must_use]
pub fn resolve<'a>(value: &'a Value, scope: &Scope<'a>) -> Cow<'a, Value> {
    match value {
        Value::String(source) => match Template::parse(source) {
            Template::Literal => Cow::Borrowed(value),
            Template::Reference(path) => path.lookup(scope).unwrap_or(Cow::Owned(Value::Null)),
            Template::Interpolated(segments) => {
                Cow::Owned(Value::String(interpolate(&segments, scope)))
            }
        },
        Value::Array(items) if contains_template(value) => Cow::Owned(Value::Array(
            items
                .iter()
                .map(|item| resolve(item, scope).into_owned())
                .collect(),
        )),
        Value::Object(map) if contains_template(value) => {
            Cow::Owned(Value::Object(resolve_map(map, scope)))
        }
        _ => Cow::Borrowed(value),
    }
}

/// Resolves every entry of a map.
#[must_use]
pub fn resolve_map(map: &Map<String, Value>, scope: &Scope<'_>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), resolve(value, scope).into_owned()))
        .collect()
}

/// Resolves a value to its string form, as interpolation would.
#[must_use]
pub fn resolve_string(value: &Value, scope: &Scope<'_>) -> String {
    stringify(&resolve(value, scope)).into_owned()
}

/// Returns `true` if any string inside the value contains an expression.
#[must_use]
pub fn contains_template(value: &Value) -> bool {
    match value {
        Value::String(source) => is_template(source),
        Value::Array(items) => items.iter().any(contains_template),
        Value::Object(map) => map.values().any(contains_template),
        _ => false,
    }
}

/// Converts a value to the text used in interpolation.
///
/// `null` becomes empty text, strings are used verbatim, and arrays and
/// objects are rendered as compact JSON.
#[must_use]
pub fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(text) => Cow::Borrowed(text.as_str()),
        Value::Bool(flag) => Cow::Borrowed(if *flag { "true" } else { "false" }),
        Value::Number(number) => Cow::Owned(number.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

fn interpolate(segments: &[Segment], scope: &Scope<'_>) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Expr(path) => {
                if let Some(value) = path.lookup(scope) {
                    out.push_str(&stringify(&value));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_scope<R>(context: Value, state: Value, f: impl FnOnce(&Scope<'_>) -> R) -> R {
        let env = json!({ "region": "eu" });
        let scope = Scope::new(&context, &state, &env);
        f(&scope)
    }

    #[test]
    fn parse_classifies_templates() {
        assert_eq!(Template::parse("plain"), Template::Literal);
        assert!(matches!(Template::parse("${a.b}"), Template::Reference(_)));
        assert!(matches!(
            Template::parse("x ${a} y"),
            Template::Interpolated(_)
        ));
        assert!(matches!(
            Template::parse("${a}${b}"),
            Template::Interpolated(_)
        ));
    }

    #[test]
    fn unterminated_expression_is_literal() {
        assert_eq!(Template::parse("cost: ${price"), Template::Literal);
        assert!(!is_template("cost: ${price"));
    }

    #[test]
    fn trailing_unterminated_expression_stays_as_text() {
        with_scope(json!({ "a": 1 }), json!({}), |scope| {
            let value = json!("${context.a} and ${oops");
            assert_eq!(*resolve(&value, scope), json!("1 and ${oops"));
        });
    }

    #[test]
    fn reference_returns_typed_values() {
        with_scope(
            json!({ "count": 3, "flag": true, "tags": ["x"] }),
            json!({}),
            |scope| {
                assert_eq!(*resolve(&json!("${context.count}"), scope), json!(3));
                assert_eq!(*resolve(&json!("${context.flag}"), scope), json!(true));
                assert_eq!(*resolve(&json!("${context.tags}"), scope), json!(["x"]));
            },
        );
    }

    #[test]
    fn missing_reference_is_null() {
        with_scope(json!({}), json!({}), |scope| {
            assert_eq!(*resolve(&json!("${state.nothing.here}"), scope), Value::Null);
        });
    }

    #[test]
    fn interpolation_stringifies_each_fragment() {
        with_scope(
            json!({ "n": 2, "ok": false, "none": null, "list": [1, 2] }),
            json!({ "who": "Ana" }),
            |scope| {
                let value = json!("${state.who}: ${context.n} ${context.ok} [${context.none}] ${context.list}");
                assert_eq!(*resolve(&value, scope), json!("Ana: 2 false [] [1,2]"));
            },
        );
    }

    #[test]
    fn env_namespace_is_readable() {
        with_scope(json!({}), json!({}), |scope| {
            assert_eq!(*resolve(&json!("region=${env.region}"), scope), json!("region=eu"));
        });
    }

    #[test]
    fn nested_structures_resolve_element_wise() {
        with_scope(json!({ "id": 7 }), json!({ "mode": "dark" }), |scope| {
            let value = json!({ "args": { "id": "${context.id}" }, "list": ["${state.mode}", 1] });
            assert_eq!(
                *resolve(&value, scope),
                json!({ "args": { "id": 7 }, "list": ["dark", 1] })
            );
        });
    }

    #[test]
    fn values_without_templates_are_borrowed() {
        with_scope(json!({}), json!({}), |scope| {
            let value = json!({ "a": [1, "two"] });
            assert!(matches!(resolve(&value, scope), Cow::Borrowed(_)));
        });
    }

    #[test]
    fn stringify_formats() {
        assert_eq!(stringify(&Value::Null), "");
        assert_eq!(stringify(&json!(1.5)), "1.5");
        assert_eq!(stringify(&json!({ "a": 1 })), "{\"a\":1}");
    }
}
