//! Contained interpreter problems and surface errors.

use thiserror::Error;

/// A problem found while rendering.
///
/// Diagnostics never stop a render: the offending node renders nothing and
/// its siblings and ancestors render normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderDiagnostic {
    /// The node's kind is not in the kind table.
    #[error("unknown component kind '{kind}'")]
    UnknownKind {
        /// The kind as authored.
        kind: String,
    },

    /// The value is not a component node.
    #[error("invalid node: {message}")]
    InvalidNode {
        /// Why it did not parse.
        message: String,
    },

    /// `CASE` or `DEFAULT` used outside a `SWITCH`.
    #[error("{kind} is only meaningful inside SWITCH")]
    Misplaced {
        /// The misplaced kind.
        kind: &'static str,
    },

    /// The tree nests deeper than the configured limit.
    #[error("component tree deeper than {max} levels")]
    DepthExceeded {
        /// The configured limit.
        max: usize,
    },

    /// A repeat produced more items than the configured cap.
    #[error("repeat of {requested} items truncated to {limit}")]
    RepeatTruncated {
        /// Items the repeat asked for.
        requested: usize,
        /// Items rendered.
        limit: usize,
    },
}

/// Errors returned to a host routing an event into a surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// No rendered element has the key.
    #[error("no element with key '{0}'")]
    ElementNotFound(String),

    /// The element has no handler for the event.
    #[error("element '{key}' has no {event} handler")]
    HandlerNotFound {
        /// The element key.
        key: String,
        /// The event prop name, e.g. `onClick`.
        event: String,
    },
}
