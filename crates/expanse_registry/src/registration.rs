//! What an extension contributes at a mount point.

use core::fmt;
use std::sync::Arc;

use expanse_actions::HostServices;
use expanse_core::RuntimeConfig;
use expanse_render::Surface;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::ChainHandler;
use crate::mount::{MountPoint, Priority};

/// A slash command offered in the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashCommand {
    /// Command name without the leading `/`.
    pub name: String,
    /// One-line help text.
    #[serde(default)]
    pub description: String,
    /// Actions run when the command is chosen.
    #[serde(default)]
    pub actions: Value,
}

/// The payload of a registration.
#[derive(Clone)]
pub enum Contribution {
    /// A component tree from a manifest, plus the overlay trees its actions
    /// may open.
    Manifest {
        /// The tree mounted at the point.
        component: Value,
        /// Named overlay trees for `OPEN_OVERLAY`.
        overlays: Map<String, Value>,
    },
    /// A code-defined pipeline handler.
    Native(Arc<dyn ChainHandler>),
}

impl fmt::Debug for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manifest { overlays, .. } => f
                .debug_struct("Manifest")
                .field("overlays", &overlays.keys().collect::<Vec<_>>())
                .finish_non_exhaustive(),
            Self::Native(_) => f.write_str("Native"),
        }
    }
}

/// One contribution of an extension to one mount point.
///
/// Both code-defined expansions and loaded manifests produce registrations,
/// so consumers never need to know where one came from.
#[derive(Debug, Clone)]
pub struct Registration {
    extension_id: String,
    point: MountPoint,
    priority: Priority,
    contribution: Contribution,
    slash_command: Option<SlashCommand>,
}

impl Registration {
    /// Creates a manifest registration.
    #[must_use]
    pub fn manifest(point: impl Into<MountPoint>, component: Value) -> Self {
        Self::new(
            point.into(),
            Contribution::Manifest {
                component,
                overlays: Map::new(),
            },
        )
    }

    /// Creates a native pipeline registration.
    #[must_use]
    pub fn native(point: impl Into<MountPoint>, handler: Arc<dyn ChainHandler>) -> Self {
        Self::new(point.into(), Contribution::Native(handler))
    }

    fn new(point: MountPoint, contribution: Contribution) -> Self {
        Self {
            extension_id: String::new(),
            point,
            priority: Priority::default(),
            contribution,
            slash_command: None,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the overlay trees. No effect on native registrations.
    #[must_use]
    pub fn with_overlays(mut self, overlays: Map<String, Value>) -> Self {
        if let Contribution::Manifest { overlays: slot, .. } = &mut self.contribution {
            *slot = overlays;
        }
        self
    }

    /// Attaches a slash command.
    #[must_use]
    pub fn with_slash_command(mut self, command: SlashCommand) -> Self {
        self.slash_command = Some(command);
        self
    }

    pub(crate) fn set_extension_id(&mut self, extension_id: &str) {
        extension_id.clone_into(&mut self.extension_id);
    }

    /// Returns the owning extension id.
    #[must_use]
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// Returns the mount point.
    #[must_use]
    pub fn point(&self) -> &MountPoint {
        &self.point
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the payload.
    #[must_use]
    pub fn contribution(&self) -> &Contribution {
        &self.contribution
    }

    /// Returns the component tree, for manifest registrations.
    #[must_use]
    pub fn component(&self) -> Option<&Value> {
        match &self.contribution {
            Contribution::Manifest { component, .. } => Some(component),
            Contribution::Native(_) => None,
        }
    }

    /// Returns the pipeline handler, for native registrations.
    #[must_use]
    pub fn handler(&self) -> Option<&Arc<dyn ChainHandler>> {
        match &self.contribution {
            Contribution::Native(handler) => Some(handler),
            Contribution::Manifest { .. } => None,
        }
    }

    /// Returns the slash command, if any.
    #[must_use]
    pub fn slash_command(&self) -> Option<&SlashCommand> {
        self.slash_command.as_ref()
    }

    /// Mounts the component tree as a fresh [`Surface`].
    ///
    /// Returns `None` for native registrations.
    #[must_use]
    pub fn mount(&self, services: HostServices, config: Arc<RuntimeConfig>) -> Option<Surface> {
        let Contribution::Manifest { component, overlays } = &self.contribution else {
            return None;
        };
        let surface = Surface::new(self.extension_id.as_str(), component.clone(), services, config)
            .with_overlays(overlays.clone());
        Some(surface)
    }
}
