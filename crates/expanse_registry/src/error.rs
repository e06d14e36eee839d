//! Registry and pipeline errors.

use thiserror::Error;

use crate::mount::MountPoint;

/// Errors raised while loading extension manifests.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The document is not a valid domain manifest.
    #[error("invalid domain manifest: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// An installed extension has no id.
    #[error("extension #{index} has no extensionId")]
    MissingExtensionId {
        /// Position in the document's extension list.
        index: usize,
    },

    /// A mount entry could not be read.
    #[error("extension '{extension_id}' mount #{index}: {message}")]
    InvalidMount {
        /// The owning extension.
        extension_id: String,
        /// Position in the extension's mount list.
        index: usize,
        /// What was wrong.
        message: String,
    },
}

/// A failure reported by a pipeline handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates a handler error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// A pipeline abort, returned to the operation that ran the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// A non-monitor handler failed; later handlers did not run.
    #[error("handler '{extension_id}' failed at {point}: {source}")]
    HandlerFailed {
        /// The failing extension.
        extension_id: String,
        /// The pipeline mount point.
        point: MountPoint,
        /// The handler's error.
        source: HandlerError,
    },
}
