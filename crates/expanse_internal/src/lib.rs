//! # Expanse Internal Library
//!
//! Re-exports the core Expanse crates for convenience.

/// Layer 0: configuration, feature flags and tracing.
pub use expanse_core;

/// Layer 1: template expressions.
pub use expanse_template;

/// Layer 2: state and action dispatch.
pub use expanse_actions;

/// Layer 3: component-tree interpretation and surfaces.
pub use expanse_render;

/// Layers 4 and 5: mount registries and priority chains.
pub use expanse_registry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use expanse_actions::{
        ActionDispatcher, BackendError, FunctionRegistry, HostServices, RunSummary, StateStore,
        ToastVariant,
    };
    pub use expanse_core::{FeatureFlags, RuntimeConfig, TracingConfig};
    pub use expanse_registry::{
        ChainReport, ClientExpansion, ExpansionRegistry, HandlerError, HandlerOutcome,
        ManifestLoader, MountPoint, MountRegistry, Priority, PriorityChain, Registration,
        handler_fn,
    };
    pub use expanse_render::{Element, ElementKind, Rendered, Surface};
    pub use expanse_template::{Scope, resolve};
}
