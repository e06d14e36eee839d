//! Error types for action dispatch.

use thiserror::Error;

/// Failure reported by a host backend or storage service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The user is not signed in. Surfaced as a sign-in prompt.
    #[error("authentication required")]
    AuthRequired,

    /// The function is not on the extension's allow-list.
    #[error("function '{function}' is not allowed for extension '{extension_id}'")]
    FunctionNotAllowed {
        /// The calling extension.
        extension_id: String,
        /// The requested function.
        function: String,
    },

    /// The function ran and reported failure.
    #[error("{0}")]
    Failed(String),

    /// The call never reached the function.
    #[error("transport error: {0}")]
    Transport(String),
}

impl BackendError {
    /// Creates a [`BackendError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates a [`BackendError::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// Failure of a single action.
///
/// Dispatch never propagates these; the dispatcher routes each one to the
/// failing action's `onError` chain or to a toast, then moves on.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    /// The descriptor names a known action but its fields do not parse.
    #[error("malformed {tag} action: {message}")]
    Malformed {
        /// The action tag.
        tag: String,
        /// Deserialization error.
        message: String,
    },

    /// A field resolved to a value the action cannot use.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The host did not provide a service the action needs.
    #[error("{service} is not available")]
    ServiceUnavailable {
        /// Human-readable service name.
        service: &'static str,
    },

    /// `OPEN_OVERLAY` named an overlay the extension does not define.
    #[error("overlay '{0}' is not defined")]
    OverlayNotFound(String),

    /// A backend or storage call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ActionError {
    /// Creates an [`ActionError::InvalidField`].
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Creates an [`ActionError::ServiceUnavailable`].
    #[must_use]
    pub fn unavailable(service: &'static str) -> Self {
        Self::ServiceUnavailable { service }
    }

    /// Returns `true` if the failure means the user must sign in.
    #[must_use]
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::Backend(BackendError::AuthRequired))
    }

    /// Returns a short machine-readable code, exposed to `onError` chains.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "MALFORMED_ACTION",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::OverlayNotFound(_) => "OVERLAY_NOT_FOUND",
            Self::Backend(BackendError::AuthRequired) => "AUTH_REQUIRED",
            Self::Backend(BackendError::FunctionNotAllowed { .. }) => "FUNCTION_NOT_ALLOWED",
            Self::Backend(BackendError::Failed(_)) => "BACKEND_ERROR",
            Self::Backend(BackendError::Transport(_)) => "TRANSPORT_ERROR",
        }
    }
}
