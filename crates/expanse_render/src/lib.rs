//! Component-tree interpretation for Expanse (Layer 3).
//!
//! Extensions describe UI as trees of component nodes:
//!
//! ```json
//! { "kind": "ROW", "children": [
//!     { "kind": "FOR_EACH", "props": { "items": "${context.email.labels}" },
//!       "children": [{ "kind": "BADGE", "props": { "text": "${item}" } }] },
//!     { "kind": "BUTTON", "props": { "label": "Summarize",
//!       "onClick": { "action": "CALL_BACKEND", "function": "summarize" } } }
//! ] }
//! ```
//!
//! The [`Interpreter`] turns such a tree, a context and a state snapshot into
//! a [`Rendered`] forest of [`Element`]s that a host can draw. Control-flow
//! kinds are evaluated away; unknown kinds render nothing and are reported as
//! [`RenderDiagnostic`]s.
//!
//! A [`Surface`] ties a tree to its own state store and dispatcher, and routes
//! element events into actions.
//!
//! # Architecture
//!
//! - [`kind`]: [`Kind`], the kind table
//! - [`node`]: [`ComponentNode`], nodes as authored
//! - [`element`]: [`Element`] and [`Rendered`], the output
//! - [`interpreter`]: [`Interpreter`]
//! - [`surface`]: [`Surface`]

pub mod element;
pub mod error;
pub mod interpreter;
pub mod kind;
pub mod node;
pub mod surface;

pub use element::{Element, ElementKind, Handler, Rendered, StateWrite};
pub use error::{RenderDiagnostic, RenderError};
pub use interpreter::{Interpreter, deferred_props, is_event_prop};
pub use kind::{Kind, LayoutKind, LeafKind};
pub use node::{ComponentNode, node_list};
pub use surface::Surface;
