//! Per-extension backend function allow-list.
//!
//! A [`FunctionRegistry`] is the only route from `CALL_BACKEND` to host logic.
//! Functions are registered under the extension that may call them; a
//! manifest naming anything else gets [`BackendError::FunctionNotAllowed`].
//!
//! The registry is mutable while the host is starting up and is then frozen
//! behind an `Arc` and handed to [`HostServices`](crate::HostServices) as the
//! backend executor.
//!
//! ```
//! use std::sync::Arc;
//! use expanse_actions::{BackendError, FunctionRegistry, HostServices};
//! use serde_json::{Value, json};
//!
//! let mut registry = FunctionRegistry::new();
//! registry.register("acme.summary", "summarize", |args: Value, _ctx: Value| async move {
//!     let text = args["text"].as_str().unwrap_or_default().to_string();
//!     Ok::<_, BackendError>(json!({ "summary": text.chars().take(20).collect::<String>() }))
//! });
//!
//! let services = HostServices::new().with_backend(Arc::new(registry));
//! # let _ = services;
//! ```

use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::BackendError;
use crate::services::BackendExecutor;

/// Boxed future returned by a [`BackendFunction`].
pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, BackendError>> + Send + 'a>>;

/// A host function callable from `CALL_BACKEND`.
pub trait BackendFunction: Send + Sync + 'static {
    /// Runs the function with resolved arguments and the caller's context.
    fn call(&self, args: Value, context: Value) -> BackendFuture<'_>;
}

impl<F, Fut> BackendFunction for F
where
    F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BackendError>> + Send + 'static,
{
    fn call(&self, args: Value, context: Value) -> BackendFuture<'_> {
        Box::pin(self(args, context))
    }
}

/// Registry of backend functions, keyed by extension id then function name.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, IndexMap<String, Arc<dyn BackendFunction>>>,
}

impl core::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (extension_id, functions) in &self.functions {
            map.entry(extension_id, &functions.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    /// Registers a function callable by one extension.
    ///
    /// # Panics
    ///
    /// Panics if the extension already registered a function with this name.
    pub fn register(
        &mut self,
        extension_id: impl Into<String>,
        name: impl Into<String>,
        function: impl BackendFunction,
    ) {
        let extension_id = extension_id.into();
        let name = name.into();
        let functions = self.functions.entry(extension_id.clone()).or_default();
        assert!(
            !functions.contains_key(&name),
            "Function '{name}' is already registered for extension '{extension_id}'"
        );
        functions.insert(name, Arc::new(function));
    }

    /// Returns whether an extension may call a function.
    #[must_use]
    pub fn is_allowed(&self, extension_id: &str, name: &str) -> bool {
        self.functions
            .get(extension_id)
            .is_some_and(|functions| functions.contains_key(name))
    }

    /// Returns the function names registered for an extension, in
    /// registration order.
    #[must_use]
    pub fn names(&self, extension_id: &str) -> Vec<&str> {
        self.functions
            .get(extension_id)
            .map(|functions| functions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BackendExecutor for FunctionRegistry {
    async fn call(
        &self,
        extension_id: &str,
        function: &str,
        args: Value,
        context: &Value,
    ) -> Result<Value, BackendError> {
        let Some(handler) = self
            .functions
            .get(extension_id)
            .and_then(|functions| functions.get(function))
            .cloned()
        else {
            tracing::warn!(extension_id, function, "backend function not allowed");
            return Err(BackendError::FunctionNotAllowed {
                extension_id: extension_id.to_string(),
                function: function.to_string(),
            });
        };
        tracing::debug!(extension_id, function, "calling backend function");
        handler.call(args, context.clone()).await
    }
}
