//! Dot-separated value paths and their namespaces.
//!
//! A path such as `state.draft.subject` is split into a [`PathRoot`] and the
//! remaining segments. The first segment selects one of the reserved
//! namespaces; anything else is looked up in the context directly.

use core::fmt;
use std::borrow::Cow;

use serde_json::Value;

use crate::scope::Scope;

/// The reserved namespaces a path may start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Caller-supplied render context (`context.*`).
    Context,
    /// The surface's mutable state (`state.*`).
    State,
    /// Host-approved environment values (`env.*`).
    Env,
}

impl Namespace {
    /// Parses a reserved namespace name.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "context" => Some(Self::Context),
            "state" => Some(Self::State),
            "env" => Some(Self::Env),
            _ => None,
        }
    }

    /// Returns the namespace name as written in expressions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::State => "state",
            Self::Env => "env",
        }
    }
}

/// Where a path starts its lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRoot {
    /// Explicitly namespaced path; the namespace segment is consumed.
    Namespace(Namespace),
    /// Shorthand path; every segment is looked up from the context root.
    Implicit,
}

/// A parsed value path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    root: PathRoot,
    segments: Vec<String>,
}

impl Path {
    /// Parses a dot-separated path expression.
    ///
    /// Surrounding whitespace is ignored. An empty expression parses to an
    /// implicit path with no segments, which resolves to nothing.
    #[must_use]
    pub fn parse(expr: &str) -> Self {
        let expr = expr.trim();
        if expr.is_empty() {
            return Self {
                root: PathRoot::Implicit,
                segments: Vec::new(),
            };
        }

        let mut parts = expr.split('.').map(|s| s.trim().to_string());
        let first = parts.next().unwrap_or_default();

        match Namespace::from_segment(&first) {
            Some(namespace) => Self {
                root: PathRoot::Namespace(namespace),
                segments: parts.collect(),
            },
            None => Self {
                root: PathRoot::Implicit,
                segments: core::iter::once(first).chain(parts).collect(),
            },
        }
    }

    /// Returns the root of this path.
    #[must_use]
    pub fn root(&self) -> PathRoot {
        self.root
    }

    /// Returns the segments following the root.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Looks the path up in the given scope.
    ///
    /// Returns `None` when any segment is missing. Values reached by plain
    /// traversal are borrowed from the scope; only the computed `length`
    /// segment produces an owned value.
    #[must_use]
    pub fn lookup<'a>(&self, scope: &Scope<'a>) -> Option<Cow<'a, Value>> {
        let start = match self.root {
            PathRoot::Namespace(namespace) => scope.namespace(namespace),
            PathRoot::Implicit => {
                // Shorthand only applies to keys the context actually carries.
                let first = self.segments.first()?;
                scope.context().get(first)?;
                scope.context()
            }
        };
        walk(start, &self.segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let PathRoot::Namespace(namespace) = self.root {
            f.write_str(namespace.as_str())?;
            if !self.segments.is_empty() {
                f.write_str(".")?;
            }
        }
        f.write_str(&self.segments.join("."))
    }
}

fn walk<'a>(start: &'a Value, segments: &[String]) -> Option<Cow<'a, Value>> {
    let mut current = start;
    for (position, segment) in segments.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get(segment.as_str()),
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items.get(index),
                Err(_) if segment == "length" => {
                    return terminal_length(items.len(), &segments[position + 1..]);
                }
                Err(_) => None,
            },
            Value::String(text) if segment == "length" => {
                return terminal_length(text.chars().count(), &segments[position + 1..]);
            }
            _ => None,
        };
        current = next?;
    }
    Some(Cow::Borrowed(current))
}

fn terminal_length<'a>(len: usize, rest: &[String]) -> Option<Cow<'a, Value>> {
    // Numbers have no children, so `items.length.x` is missing.
    if rest.is_empty() {
        Some(Cow::Owned(Value::from(len)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_reserved_namespace() {
        let path = Path::parse("state.draft.subject");
        assert_eq!(path.root(), PathRoot::Namespace(Namespace::State));
        assert_eq!(path.segments(), ["draft", "subject"]);
    }

    #[test]
    fn parse_shorthand_keeps_first_segment() {
        let path = Path::parse(" email.subject ");
        assert_eq!(path.root(), PathRoot::Implicit);
        assert_eq!(path.segments(), ["email", "subject"]);
    }

    #[test]
    fn display_round_trips_expression() {
        assert_eq!(Path::parse("env.apiBase").to_string(), "env.apiBase");
        assert_eq!(Path::parse("item.name").to_string(), "item.name");
        assert_eq!(Path::parse("context").to_string(), "context");
    }

    #[test]
    fn lookup_indexes_arrays_and_counts_length() {
        let context = json!({ "items": [{ "name": "a" }, { "name": "b" }] });
        let state = json!({});
        let env = json!({});
        let scope = Scope::new(&context, &state, &env);

        let name = Path::parse("context.items.1.name").lookup(&scope);
        assert_eq!(name.as_deref(), Some(&json!("b")));

        let len = Path::parse("items.length").lookup(&scope);
        assert_eq!(len.as_deref(), Some(&json!(2)));

        assert!(Path::parse("items.length.value").lookup(&scope).is_none());
        assert!(Path::parse("items.7.name").lookup(&scope).is_none());
    }

    #[test]
    fn shorthand_requires_top_level_context_key() {
        let context = json!({ "user": { "name": "Ana" } });
        let state = json!({ "user": "from state" });
        let env = json!({});
        let scope = Scope::new(&context, &state, &env);

        assert_eq!(
            Path::parse("user.name").lookup(&scope).as_deref(),
            Some(&json!("Ana"))
        );
        assert!(Path::parse("missing.name").lookup(&scope).is_none());
    }
}
