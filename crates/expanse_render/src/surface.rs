//! Mounted surfaces.
//!
//! A [`Surface`] is one mounted instance of a component tree: the tree, the
//! state store it reads and writes, and a dispatcher bound to the owning
//! extension. Rendering and event handling are explicit calls; the host
//! re-renders after state changes, typically from a
//! [`StateStore::subscribe`] listener.

use core::fmt;
use std::sync::Arc;

use expanse_actions::{ActionDispatcher, HostServices, OverlayRequest, RunSummary, StateStore};
use expanse_core::RuntimeConfig;
use serde_json::{Map, Value};

use crate::element::{Element, Rendered};
use crate::error::RenderError;
use crate::interpreter::Interpreter;

/// One mounted component tree with its own state.
///
/// Dropping the surface unmounts it and discards its state.
pub struct Surface {
    id: String,
    root: Value,
    overlays: Map<String, Value>,
    state: StateStore,
    dispatcher: ActionDispatcher,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("extension_id", &self.dispatcher.extension_id())
            .field("overlays", &self.overlays.keys().collect::<Vec<_>>())
            .field("state_version", &self.state.version())
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Mounts a tree for an extension with empty state.
    #[must_use]
    pub fn new(
        extension_id: impl Into<Arc<str>>,
        root: Value,
        services: HostServices,
        config: Arc<RuntimeConfig>,
    ) -> Self {
        Self::with_dispatcher(root, ActionDispatcher::new(extension_id, services, config))
    }

    /// Mounts a tree with an existing dispatcher.
    #[must_use]
    pub fn with_dispatcher(root: Value, dispatcher: ActionDispatcher) -> Self {
        let id = nanoid::nanoid!();
        tracing::debug!(surface = %id, extension_id = dispatcher.extension_id(), "surface mounted");
        Self {
            id,
            root,
            overlays: Map::new(),
            state: StateStore::new(),
            dispatcher,
        }
    }

    /// Makes named overlay trees available to `OPEN_OVERLAY` as
    /// `context.overlays`.
    #[must_use]
    pub fn with_overlays(mut self, overlays: Map<String, Value>) -> Self {
        self.overlays = overlays;
        self
    }

    /// Seeds the state store.
    #[must_use]
    pub fn with_state(mut self, values: Map<String, Value>) -> Self {
        self.state = StateStore::with_values(values);
        self
    }

    /// Returns the unique id of this mount.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the owning extension id.
    #[must_use]
    pub fn extension_id(&self) -> &str {
        self.dispatcher.extension_id()
    }

    /// Returns the surface's state store.
    #[must_use]
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Returns the dispatcher used for this surface's events.
    #[must_use]
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Renders the tree against a caller-supplied context.
    ///
    /// `SET_VAR` writes collected during the pass are applied afterwards, so
    /// they become visible on the next render.
    pub fn render(&self, context: &Value) -> Rendered {
        let context = self.context(context);
        self.render_tree(&self.root, &context)
    }

    /// Renders an overlay opened by this surface's `OPEN_OVERLAY`.
    pub fn render_overlay(&self, request: &OverlayRequest) -> Rendered {
        self.render_tree(&request.node, &request.context)
    }

    fn render_tree(&self, root: &Value, context: &Value) -> Rendered {
        let snapshot = self.state.snapshot();
        let rendered =
            Interpreter::new(self.dispatcher.config(), &snapshot, self.dispatcher.env()).render(root, context);
        for write in &rendered.writes {
            self.state.set(&write.path, write.value.clone());
        }
        rendered
    }

    /// Handles an event on a rendered element.
    ///
    /// For `onChange` on a bound input the new value is written to state
    /// first. The element's actions then run with `value` in the extra
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::HandlerNotFound`] if the element has no handler
    /// for the event.
    pub async fn trigger(&self, element: &Element, event: &str, value: Value) -> Result<RunSummary, RenderError> {
        let handler = element.handler(event).ok_or_else(|| RenderError::HandlerNotFound {
            key: element.key.clone(),
            event: event.to_string(),
        })?;

        if event == "onChange"
            && let Some(path) = &element.bind_to
        {
            self.state.set(path, value.clone());
        }

        let mut extra = Map::new();
        extra.insert("value".into(), value);
        Ok(self
            .dispatcher
            .run(&handler.actions, &handler.context, &self.state, extra)
            .await)
    }

    /// Finds an element by key in a render result and handles an event on it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ElementNotFound`] for an unknown key, or
    /// [`RenderError::HandlerNotFound`] as for [`Surface::trigger`].
    pub async fn fire(
        &self,
        rendered: &Rendered,
        key: &str,
        event: &str,
        value: Value,
    ) -> Result<RunSummary, RenderError> {
        let element = rendered
            .find(key)
            .ok_or_else(|| RenderError::ElementNotFound(key.to_string()))?;
        self.trigger(element, event, value).await
    }

    fn context(&self, context: &Value) -> Value {
        let mut map = match context {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if !self.overlays.is_empty() && !map.contains_key("overlays") {
            map.insert("overlays".into(), Value::Object(self.overlays.clone()));
        }
        Value::Object(map)
    }
}
