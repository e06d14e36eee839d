//! Code-defined client expansions.

use std::sync::Arc;

use expanse_core::FeatureFlags;

use crate::registration::Registration;
use crate::registry::MountRegistry;

/// An expansion compiled into the client.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use expanse_registry::{
///     ClientExpansion, ExpansionRegistry, HandlerError, HandlerOutcome, MountPoint,
///     MountRegistry, Registration, handler_fn,
/// };
/// use expanse_core::FeatureFlags;
///
/// struct Signature;
///
/// impl ClientExpansion for Signature {
///     const ID: &'static str = "acme.signature";
///
///     fn contributions(&self) -> Vec<Registration> {
///         vec![Registration::native(
///             MountPoint::PreSend,
///             handler_fn(|_message| async { Ok::<_, HandlerError>(HandlerOutcome::Continue) }),
///         )]
///     }
/// }
///
/// let registry = Arc::new(MountRegistry::new());
/// let mut expansions = ExpansionRegistry::new(Arc::clone(&registry), FeatureFlags::all_enabled());
/// assert!(expansions.add(Signature));
/// assert!(registry.contains("acme.signature"));
/// ```
pub trait ClientExpansion: Send + Sync + 'static {
    /// Extension id. Also names the feature flag gating the expansion.
    const ID: &'static str;

    /// Returns what the expansion mounts.
    fn contributions(&self) -> Vec<Registration>;
}

/// Registers client expansions into a [`MountRegistry`], honoring feature
/// flags.
#[derive(Debug)]
pub struct ExpansionRegistry {
    registry: Arc<MountRegistry>,
    flags: FeatureFlags,
    enabled: Vec<&'static str>,
}

impl ExpansionRegistry {
    /// Creates a registry writing into `registry`.
    #[must_use]
    pub fn new(registry: Arc<MountRegistry>, flags: FeatureFlags) -> Self {
        Self {
            registry,
            flags,
            enabled: Vec::new(),
        }
    }

    /// Registers an expansion if its feature flag is on.
    ///
    /// Returns `true` if it was registered. Adding the same expansion again
    /// replaces its earlier registrations.
    pub fn add<E: ClientExpansion>(&mut self, expansion: E) -> bool {
        if !self.flags.is_enabled(E::ID) {
            tracing::debug!(extension_id = E::ID, "expansion disabled by feature flag");
            return false;
        }
        self.registry.register_extension(E::ID, expansion.contributions());
        if !self.enabled.contains(&E::ID) {
            self.enabled.push(E::ID);
        }
        true
    }

    /// Lists the ids of registered expansions.
    #[must_use]
    pub fn enabled(&self) -> &[&'static str] {
        &self.enabled
    }

    /// Returns the underlying mount registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<MountRegistry> {
        &self.registry
    }
}
