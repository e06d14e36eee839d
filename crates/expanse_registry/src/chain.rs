//! Prioritized pipelines.
//!
//! A pipeline mount point such as [`MountPoint::PreSend`] runs every native
//! handler registered there over one accumulator value, highest priority
//! first:
//!
//! 1. Registrations are stable-sorted by descending [`Priority`]; ties keep
//!    registration order.
//! 2. Each handler sees the current accumulator.
//! 3. [`HandlerOutcome::Update`] shallow-merges into the accumulator;
//!    [`HandlerOutcome::Stop`] ends the pipeline as intercepted.
//! 4. Monitor handlers run with the accumulator too, but their outcome is
//!    discarded and their errors are logged and absorbed.
//! 5. Any other handler error aborts the pipeline with a [`ChainError`].
//!
//! Manifest registrations at a pipeline point have no handler and are
//! skipped.

use core::cmp::Reverse;
use core::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::error::{ChainError, HandlerError};
use crate::mount::{MountPoint, Priority};
use crate::registry::MountRegistry;

/// What a handler asks the pipeline to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// Leave the value unchanged and continue.
    Continue,
    /// Merge these fields into the value and continue.
    Update(Map<String, Value>),
    /// Stop the pipeline; the triggering operation is intercepted.
    Stop,
}

/// A code-defined pipeline handler.
#[async_trait]
pub trait ChainHandler: Send + Sync + 'static {
    /// Inspects the current pipeline value.
    ///
    /// # Errors
    ///
    /// An error aborts the pipeline unless the handler is registered at
    /// [`Priority::Monitor`].
    async fn handle(&self, value: &Value) -> Result<HandlerOutcome, HandlerError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ChainHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerOutcome, HandlerError>> + Send + 'static,
{
    async fn handle(&self, value: &Value) -> Result<HandlerOutcome, HandlerError> {
        (self.0)(value.clone()).await
    }
}

/// Wraps an async closure as a [`ChainHandler`].
///
/// The closure receives a copy of the current value.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ChainHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerOutcome, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// The result of a pipeline that ran to completion or was stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReport {
    /// Extension ids whose handlers ran, in order.
    pub ran: Vec<String>,
    /// The extension that stopped the pipeline, if any.
    pub intercepted_by: Option<String>,
    /// The final value.
    pub value: Value,
}

impl ChainReport {
    /// Returns `true` if a handler stopped the pipeline.
    #[must_use]
    pub fn is_intercepted(&self) -> bool {
        self.intercepted_by.is_some()
    }
}

/// Runs pipelines over the handlers in a [`MountRegistry`].
#[derive(Clone)]
pub struct PriorityChain {
    registry: Arc<MountRegistry>,
}

impl fmt::Debug for PriorityChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityChain")
            .field("registry", &self.registry)
            .finish()
    }
}

impl PriorityChain {
    /// Creates a chain reading from a registry.
    #[must_use]
    pub fn new(registry: Arc<MountRegistry>) -> Self {
        Self { registry }
    }

    /// Runs the pipeline at `point` over `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::HandlerFailed`] when a non-monitor handler
    /// fails. Handlers after it do not run.
    pub async fn run(&self, point: &MountPoint, value: Value) -> Result<ChainReport, ChainError> {
        let span = tracing::debug_span!("chain", %point);
        self.run_inner(point, value).instrument(span).await
    }

    async fn run_inner(&self, point: &MountPoint, value: Value) -> Result<ChainReport, ChainError> {
        let mut registrations = self.registry.by_mount_point(point);
        registrations.sort_by_key(|registration| Reverse(registration.priority()));

        let mut report = ChainReport {
            ran: Vec::new(),
            intercepted_by: None,
            value,
        };

        for registration in registrations {
            let extension_id = registration.extension_id();
            let Some(handler) = registration.handler() else {
                tracing::debug!(extension_id, "no handler, skipping");
                continue;
            };
            let priority = registration.priority();
            tracing::debug!(extension_id, %priority, "running handler");

            let outcome = handler.handle(&report.value).await;
            report.ran.push(extension_id.to_string());

            if priority == Priority::Monitor {
                if let Err(err) = outcome {
                    tracing::warn!(extension_id, error = %err, "monitor handler failed");
                }
                continue;
            }

            match outcome {
                Ok(HandlerOutcome::Continue) => {}
                Ok(HandlerOutcome::Update(partial)) => merge(&mut report.value, partial),
                Ok(HandlerOutcome::Stop) => {
                    tracing::info!(extension_id, "pipeline intercepted");
                    report.intercepted_by = Some(extension_id.to_string());
                    break;
                }
                Err(source) => {
                    tracing::error!(extension_id, error = %source, "pipeline aborted");
                    return Err(ChainError::HandlerFailed {
                        extension_id: extension_id.to_string(),
                        point: point.clone(),
                        source,
                    });
                }
            }
        }

        Ok(report)
    }
}

fn merge(target: &mut Value, partial: Map<String, Value>) {
    match target {
        Value::Object(map) => map.extend(partial),
        other => *other = Value::Object(partial),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_is_shallow() {
        let mut value = json!({ "subject": "Hi", "meta": { "a": 1 } });
        let mut partial = Map::new();
        partial.insert("meta".into(), json!({ "b": 2 }));
        merge(&mut value, partial);
        assert_eq!(value, json!({ "subject": "Hi", "meta": { "b": 2 } }));
    }

    #[test]
    fn merge_replaces_non_objects() {
        let mut value = json!("draft");
        let mut partial = Map::new();
        partial.insert("body".into(), json!("x"));
        merge(&mut value, partial);
        assert_eq!(value, json!({ "body": "x" }));
    }
}
