//! Mount points, extension registries and prioritized pipelines for Expanse
//! (Layers 4 and 5).
//!
//! Extensions contribute to host slots ([`MountPoint`]s) through
//! [`Registration`]s. Two sources feed the same [`MountRegistry`]:
//!
//! - [`ClientExpansion`]s compiled into the client, added through an
//!   [`ExpansionRegistry`] that honors per-extension feature flags
//! - domain manifests, read by a [`ManifestLoader`]
//!
//! Renderers ask the registry for the registrations at a point and mount
//! their component trees. Pipeline points such as [`MountPoint::PreSend`]
//! are run by a [`PriorityChain`].
//!
//! # Architecture
//!
//! - [`mount`]: [`MountPoint`] and [`Priority`]
//! - [`registration`]: [`Registration`], [`Contribution`], [`SlashCommand`]
//! - [`registry`]: [`MountRegistry`]
//! - [`manifest`]: [`ManifestLoader`]
//! - [`expansion`]: [`ClientExpansion`] and [`ExpansionRegistry`]
//! - [`chain`]: [`PriorityChain`] and [`ChainHandler`]

pub mod chain;
pub mod error;
pub mod expansion;
pub mod manifest;
pub mod mount;
pub mod registration;
pub mod registry;

pub use chain::{ChainHandler, ChainReport, HandlerOutcome, PriorityChain, handler_fn};
pub use error::{ChainError, HandlerError, RegistryError};
pub use expansion::{ClientExpansion, ExpansionRegistry};
pub use manifest::{DomainManifest, LoadReport, ManifestLoader};
pub use mount::{MountPoint, Priority};
pub use registration::{Contribution, Registration, SlashCommand};
pub use registry::MountRegistry;
