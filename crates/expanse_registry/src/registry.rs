//! The process-wide mount registry.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::mount::MountPoint;
use crate::registration::{Registration, SlashCommand};

/// Registrations keyed by mount point.
///
/// Within a mount point, registrations keep the order in which their
/// extensions were registered. Registering an extension id again replaces
/// everything that id registered before.
///
/// # Thread Safety
///
/// All operations take `&self`. Each write replaces an extension's
/// registrations under a single write lock, so readers never observe a
/// partially-updated mount point.
#[derive(Default)]
pub struct MountRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    points: HashMap<MountPoint, Vec<Arc<Registration>>>,
    // Registration order of extension ids.
    extensions: Vec<String>,
}

impl fmt::Debug for MountRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("MountRegistry")
            .field("extensions", &inner.extensions)
            .field("points", &inner.points.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MountRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extension's contributions, replacing any it had before.
    ///
    /// Every registration is stamped with `extension_id`. Returns the number
    /// of registrations now held for the extension.
    pub fn register_extension(
        &self,
        extension_id: &str,
        registrations: impl IntoIterator<Item = Registration>,
    ) -> usize {
        let registrations: Vec<Arc<Registration>> = registrations
            .into_iter()
            .map(|mut registration| {
                registration.set_extension_id(extension_id);
                Arc::new(registration)
            })
            .collect();
        let count = registrations.len();

        let mut inner = self.inner.write();
        let replaced = inner.remove(extension_id);
        for registration in registrations {
            inner
                .points
                .entry(registration.point().clone())
                .or_default()
                .push(registration);
        }
        inner.extensions.push(extension_id.to_string());
        drop(inner);

        tracing::info!(extension_id, count, replaced, "extension registered");
        count
    }

    /// Removes everything an extension registered.
    ///
    /// Returns `true` if the extension was registered.
    pub fn unregister(&self, extension_id: &str) -> bool {
        let removed = self.inner.write().remove(extension_id);
        if removed {
            tracing::info!(extension_id, "extension unregistered");
        }
        removed
    }

    /// Returns the registrations at a mount point, in registration order.
    #[must_use]
    pub fn by_mount_point(&self, point: &MountPoint) -> Vec<Arc<Registration>> {
        self.inner
            .read()
            .points
            .get(point)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every registration of one extension.
    #[must_use]
    pub fn by_extension(&self, extension_id: &str) -> Vec<Arc<Registration>> {
        let inner = self.inner.read();
        inner
            .points
            .values()
            .flatten()
            .filter(|registration| registration.extension_id() == extension_id)
            .cloned()
            .collect()
    }

    /// Lists slash commands as `(extension id, command)`, sorted by name.
    #[must_use]
    pub fn slash_commands(&self) -> Vec<(String, SlashCommand)> {
        let inner = self.inner.read();
        let mut commands: Vec<(String, SlashCommand)> = inner
            .points
            .values()
            .flatten()
            .filter_map(|registration| {
                registration
                    .slash_command()
                    .map(|command| (registration.extension_id().to_string(), command.clone()))
            })
            .collect();
        drop(inner);
        commands.sort_by(|a, b| a.1.name.cmp(&b.1.name).then_with(|| a.0.cmp(&b.0)));
        commands
    }

    /// Checks if an extension is registered.
    #[must_use]
    pub fn contains(&self, extension_id: &str) -> bool {
        self.inner.read().extensions.iter().any(|id| id == extension_id)
    }

    /// Lists registered extension ids in registration order.
    #[must_use]
    pub fn extension_ids(&self) -> Vec<String> {
        self.inner.read().extensions.clone()
    }

    /// Returns the total number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().points.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    fn remove(&mut self, extension_id: &str) -> bool {
        let Some(position) = self.extensions.iter().position(|id| id == extension_id) else {
            return false;
        };
        self.extensions.remove(position);
        for registrations in self.points.values_mut() {
            registrations.retain(|registration| registration.extension_id() != extension_id);
        }
        self.points.retain(|_, registrations| !registrations.is_empty());
        true
    }
}
