//! Core infrastructure for Expanse.
//!
//! This crate provides the ambient pieces every host needs before mounting
//! any expansion:
//!
//! - [`TracingConfig`] - Logging and observability via the `tracing` crate
//! - [`RuntimeConfig`] - The `env` namespace and interpreter safety limits
//! - [`FeatureFlags`] - Per-extension gates for code-defined expansions
//!
//! # Example
//!
//! ```no_run
//! use expanse_core::{FeatureFlags, RuntimeConfig, TracingConfig};
//!
//! TracingConfig::default().init();
//! let config = RuntimeConfig::from_env().expect("valid configuration");
//! let flags = FeatureFlags::from_env();
//! # let _ = (config, flags);
//! ```
//!
//! # Architecture
//!
//! This crate is the bottom of the Expanse stack:
//!
//! - **Layer 0** (`expanse_core`): configuration and tracing
//! - **Layer 1** (`expanse_template`): expression resolution
//! - **Layer 2** (`expanse_actions`): state and action dispatch
//! - **Layer 3** (`expanse_render`): component-tree interpretation
//! - **Layer 4** (`expanse_registry`): mount points and priority chains

mod config;
mod flags;
mod tracing_setup;

pub use config::{ConfigError, PUBLIC_ENV_PREFIX, RuntimeConfig};
pub use flags::{FEATURE_PREFIX, FeatureFlags, flag_variable};
pub use tracing_setup::{LOG_FORMAT_VAR, LOG_VAR, RUNTIME_TARGETS, TracingConfig, TracingFormat};
