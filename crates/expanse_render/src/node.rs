//! Authored component nodes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RenderDiagnostic;

/// One node of a manifest component tree, as authored.
///
/// Children stay raw JSON so that one malformed child only costs that child.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    /// Kind string, matched by [`Kind::parse`](crate::Kind::parse).
    #[serde(alias = "type")]
    pub kind: String,
    /// Props; values may contain templates.
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<Value>,
}

impl ComponentNode {
    /// Creates a node with no props or children.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Adds a prop.
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Adds a child.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Value>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Reads a node from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RenderDiagnostic::InvalidNode`] if the value is not a node
    /// object with a string `kind`.
    pub fn parse(value: &Value) -> Result<Self, RenderDiagnostic> {
        Self::deserialize(value).map_err(|err| RenderDiagnostic::InvalidNode {
            message: err.to_string(),
        })
    }

    /// Returns the first of several prop names that is present.
    #[must_use]
    pub fn prop(&self, names: &[&str]) -> Option<&Value> {
        names.iter().find_map(|name| self.props.get(*name))
    }
}

impl From<ComponentNode> for Value {
    fn from(node: ComponentNode) -> Self {
        serde_json::to_value(node).unwrap_or(Value::Null)
    }
}

/// Normalizes a sub-template prop (one node or a list) into a slice.
#[must_use]
pub fn node_list(value: &Value) -> &[Value] {
    match value {
        Value::Array(nodes) => nodes,
        Value::Null => &[],
        single => core::slice::from_ref(single),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_is_an_alias_for_kind() {
        let node = ComponentNode::parse(&json!({ "type": "button", "props": { "label": "Go" } }))
            .expect("node should parse");
        assert_eq!(node.kind, "button");
        assert_eq!(node.prop(&["text", "label"]), Some(&json!("Go")));
        assert!(node.children.is_empty());
    }

    #[test]
    fn missing_kind_is_invalid() {
        assert!(matches!(
            ComponentNode::parse(&json!({ "props": {} })),
            Err(RenderDiagnostic::InvalidNode { .. })
        ));
    }

    #[test]
    fn builder_round_trips_through_json() {
        let node = ComponentNode::new("ROW")
            .with_prop("gap", 4)
            .with_child(ComponentNode::new("TEXT").with_prop("text", "hi"));
        let value = Value::from(node.clone());
        assert_eq!(ComponentNode::parse(&value).expect("should parse"), node);
    }
}
