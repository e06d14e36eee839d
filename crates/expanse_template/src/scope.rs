//! The three value sources an expression can read from.

use serde_json::Value;

use crate::path::Namespace;

/// Borrowed view over the context, state, and environment of one evaluation.
///
/// Each source is expected to be a JSON object; any other value simply makes
/// every lookup into it miss.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    context: &'a Value,
    state: &'a Value,
    env: &'a Value,
}

impl<'a> Scope<'a> {
    /// Creates a scope from its three sources.
    #[must_use]
    pub fn new(context: &'a Value, state: &'a Value, env: &'a Value) -> Self {
        Self {
            context,
            state,
            env,
        }
    }

    /// Returns the render context.
    #[must_use]
    pub fn context(&self) -> &'a Value {
        self.context
    }

    /// Returns the state snapshot.
    #[must_use]
    pub fn state(&self) -> &'a Value {
        self.state
    }

    /// Returns the environment values.
    #[must_use]
    pub fn env(&self) -> &'a Value {
        self.env
    }

    /// Returns the source backing a reserved namespace.
    #[must_use]
    pub fn namespace(&self, namespace: Namespace) -> &'a Value {
        match namespace {
            Namespace::Context => self.context,
            Namespace::State => self.state,
            Namespace::Env => self.env,
        }
    }

    /// Returns a scope with the same state and environment but a different context.
    #[must_use]
    pub fn with_context(&self, context: &'a Value) -> Self {
        Self { context, ..*self }
    }
}
