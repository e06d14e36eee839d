//! Action dispatch for Expanse (Layer 2).
//!
//! Manifests describe behavior as lists of action descriptors:
//!
//! ```json
//! [
//!   { "action": "SET_LOADING", "value": true },
//!   { "action": "CALL_BACKEND", "function": "summarize",
//!     "args": { "id": "${context.email.id}" }, "targetState": "summary" },
//!   { "action": "SET_LOADING", "value": false }
//! ]
//! ```
//!
//! This crate decodes those descriptors into the closed [`Action`]
//! vocabulary and runs them in order through an [`ActionDispatcher`],
//! against a per-surface [`StateStore`] and a bundle of [`HostServices`].
//!
//! # Architecture
//!
//! - [`state`]: [`StateStore`], the mutable state of one surface
//! - [`action`]: [`Action`] and descriptor decoding
//! - [`services`]: host service traits and [`HostServices`]
//! - [`functions`]: [`FunctionRegistry`], the per-extension allow-list
//! - [`dispatcher`]: [`ActionDispatcher`]

pub mod action;
pub mod dispatcher;
pub mod error;
pub mod functions;
pub mod services;
pub mod state;

pub use action::{Action, Decoded, OAuthMode, ToastVariant, decode, descriptors};
pub use dispatcher::{ActionDispatcher, DEFAULT_WIZARD_ID, RunSummary, wizard_state_key};
pub use error::{ActionError, BackendError};
pub use functions::{BackendFunction, BackendFuture, FunctionRegistry};
pub use services::{
    BackendExecutor, BackendResponse, Clipboard, EditorBridge, HostServices, Navigator,
    Notifier, OAUTH_PATH, OAuthBridge, OAuthOutcome, OAuthRequest, OverlayHost, OverlayRequest,
    SecureStorage, oauth_url,
};
pub use state::{StateChange, StateStore, SubscriptionId};
