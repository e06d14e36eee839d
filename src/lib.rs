//! A sandboxed expansion runtime for webmail clients.
//!
//! Extensions contribute component trees and action chains to named mount
//! points in the client. This crate re-exports the Expanse sub-crates:
//!
//! - [`expanse_template`]: `${...}` placeholder resolution
//! - [`expanse_render`]: the component-tree interpreter and mounted surfaces
//! - [`expanse_actions`]: the action dispatcher and host services
//! - [`expanse_registry`]: mount points, priority chains and domain manifests
//! - [`expanse_core`]: runtime configuration, feature flags and tracing setup

pub use expanse_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use expanse_internal::prelude::*;
}
