//! The interpreter's output tree.
//!
//! An [`Element`] is a fully resolved, host-renderable description of one
//! visual component: its kind, resolved props, children, and the event
//! handlers it carries. Control-flow kinds never appear here; they have
//! already been evaluated away.

use core::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::RenderDiagnostic;
use crate::kind::{LayoutKind, LeafKind};

/// Kind of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A display or input component.
    Leaf(LeafKind),
    /// A layout container.
    Layout(LayoutKind),
    /// A wizard frame holding the current step.
    Wizard,
    /// A diagnostic dump.
    Debug,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => f.write_str(leaf.as_str()),
            Self::Layout(layout) => f.write_str(layout.as_str()),
            Self::Wizard => f.write_str("WIZARD"),
            Self::Debug => f.write_str("DEBUG"),
        }
    }
}

/// An event handler attached to an element.
///
/// The handler keeps the derived context it was rendered in, so an event
/// inside a `FOR_EACH` item still sees its `item` and `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    /// Event prop name, e.g. `onClick`.
    pub event: String,
    /// Raw action descriptor or list; `null` for a pure `bindTo` write.
    pub actions: Value,
    /// The context the element was rendered with.
    pub context: Arc<Value>,
}

/// One rendered component.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Position-derived key, stable for the same inputs (`0`, `0.1`, ...).
    pub key: String,
    /// What to draw.
    pub kind: ElementKind,
    /// Resolved props, without sub-templates or event props.
    pub props: Map<String, Value>,
    /// Rendered children.
    pub children: Vec<Element>,
    /// State path an input writes to on change.
    pub bind_to: Option<String>,
    /// Event handlers.
    pub handlers: Vec<Handler>,
}

impl Element {
    pub(crate) fn new(kind: ElementKind, props: Map<String, Value>) -> Self {
        Self {
            key: String::new(),
            kind,
            props,
            children: Vec::new(),
            bind_to: None,
            handlers: Vec::new(),
        }
    }

    /// Returns the handler for an event prop name.
    #[must_use]
    pub fn handler(&self, event: &str) -> Option<&Handler> {
        self.handlers.iter().find(|handler| handler.event == event)
    }

    /// Returns a resolved prop.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Returns the element's visible text (`text`, `label` or `content`).
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        ["text", "label", "content"]
            .iter()
            .find_map(|name| self.props.get(*name).and_then(Value::as_str))
    }

    /// Iterates over this element and all of its descendants, depth-first.
    pub fn descendants(&self) -> impl Iterator<Item = &Element> {
        let mut stack = vec![self];
        core::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// A deferred state write produced by `SET_VAR`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateWrite {
    /// Dotted state path.
    pub path: String,
    /// New value.
    pub value: Value,
}

/// The result of one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// Top-level elements.
    pub elements: Vec<Element>,
    /// Problems encountered; each affected node rendered nothing.
    pub diagnostics: Vec<RenderDiagnostic>,
    /// `SET_VAR` writes for the host to apply after the pass.
    pub writes: Vec<StateWrite>,
}

impl Rendered {
    /// Iterates over every element, depth-first.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().flat_map(Element::descendants)
    }

    /// Finds an element by key.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Element> {
        self.iter().find(|element| element.key == key)
    }

    /// Returns every element of a kind, in document order.
    #[must_use]
    pub fn by_kind(&self, kind: ElementKind) -> Vec<&Element> {
        self.iter().filter(|element| element.kind == kind).collect()
    }
}

/// Assigns position-derived keys to a rendered forest.
pub(crate) fn assign_keys(elements: &mut [Element], prefix: &str) {
    for (index, element) in elements.iter_mut().enumerate() {
        element.key = if prefix.is_empty() {
            index.to_string()
        } else {
            format!("{prefix}.{index}")
        };
        let key = element.key.clone();
        assign_keys(&mut element.children, &key);
    }
}
