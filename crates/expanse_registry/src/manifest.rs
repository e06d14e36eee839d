//! Loading registrations from a domain's installed-extension manifest.
//!
//! A domain manifest lists the extensions installed for one mail domain:
//!
//! ```json
//! { "extensions": [{
//!     "extensionId": "acme.summarize",
//!     "enabled": true,
//!     "template": {
//!         "mounts": [{ "point": "EMAIL_VIEWER_TOOLBAR", "priority": "NORMAL",
//!                      "component": { "kind": "BUTTON", "props": { "label": "Summarize" } } }],
//!         "overlays": { "summary": { "kind": "MARKDOWN", "props": { "content": "${state.summary}" } } }
//!     }
//! }] }
//! ```

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::mount::{MountPoint, Priority};
use crate::registration::{Registration, SlashCommand};
use crate::registry::MountRegistry;

/// A domain's installed-extension document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainManifest {
    /// Installed extensions.
    #[serde(default)]
    pub extensions: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstalledExtension {
    #[serde(default, alias = "id")]
    extension_id: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    template: ExtensionTemplate,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Default, Deserialize)]
struct ExtensionTemplate {
    #[serde(default)]
    mounts: Vec<Value>,
    #[serde(default)]
    overlays: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MountEntry {
    #[serde(alias = "mountPoint")]
    point: MountPoint,
    #[serde(default)]
    priority: Priority,
    #[serde(alias = "node")]
    component: Value,
    #[serde(default)]
    slash_command: Option<SlashCommand>,
}

/// Outcome of loading one domain manifest.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Extensions (re)registered.
    pub loaded: Vec<String>,
    /// Disabled extensions; any earlier registrations were removed.
    pub disabled: Vec<String>,
    /// Entries that could not be read. The rest of the document still loaded.
    pub errors: Vec<RegistryError>,
}

/// Reads domain manifests into a [`MountRegistry`].
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    registry: Arc<MountRegistry>,
}

impl ManifestLoader {
    /// Creates a loader writing into `registry`.
    #[must_use]
    pub fn new(registry: Arc<MountRegistry>) -> Self {
        Self { registry }
    }

    /// Parses and loads a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDocument`] if the text is not a domain
    /// manifest. Problems with single extensions or mounts are reported in
    /// the [`LoadReport`] instead.
    pub fn load_str(&self, json: &str) -> Result<LoadReport, RegistryError> {
        let manifest: DomainManifest = serde_json::from_str(json)?;
        Ok(self.load(&manifest))
    }

    /// Parses and loads a manifest from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDocument`] if the value is not a domain
    /// manifest.
    pub fn load_value(&self, value: Value) -> Result<LoadReport, RegistryError> {
        let manifest: DomainManifest = serde_json::from_value(value)?;
        Ok(self.load(&manifest))
    }

    /// Loads every enabled extension of a manifest.
    ///
    /// An extension whose mounts all fail to read is not registered.
    pub fn load(&self, manifest: &DomainManifest) -> LoadReport {
        let mut report = LoadReport::default();

        for (index, raw) in manifest.extensions.iter().enumerate() {
            let extension = match InstalledExtension::deserialize(raw) {
                Ok(extension) if !extension.extension_id.is_empty() => extension,
                Ok(_) => {
                    report.errors.push(RegistryError::MissingExtensionId { index });
                    continue;
                }
                Err(err) => {
                    report.errors.push(RegistryError::InvalidDocument(err));
                    continue;
                }
            };
            let id = extension.extension_id;

            if !extension.enabled {
                tracing::debug!(extension_id = %id, "extension disabled");
                self.registry.unregister(&id);
                report.disabled.push(id);
                continue;
            }

            let overlays = extension.template.overlays;
            let mut registrations = Vec::with_capacity(extension.template.mounts.len());
            for (mount_index, raw_mount) in extension.template.mounts.iter().enumerate() {
                match MountEntry::deserialize(raw_mount) {
                    Ok(entry) => registrations.push(registration(entry, &overlays)),
                    Err(err) => {
                        tracing::warn!(extension_id = %id, index = mount_index, error = %err, "invalid mount");
                        report.errors.push(RegistryError::InvalidMount {
                            extension_id: id.clone(),
                            index: mount_index,
                            message: err.to_string(),
                        });
                    }
                }
            }

            if registrations.is_empty() && !extension.template.mounts.is_empty() {
                continue;
            }
            self.registry.register_extension(&id, registrations);
            report.loaded.push(id);
        }

        report
    }
}

fn registration(entry: MountEntry, overlays: &Map<String, Value>) -> Registration {
    let registration = Registration::manifest(entry.point, entry.component)
        .with_priority(entry.priority)
        .with_overlays(overlays.clone());
    match entry.slash_command {
        Some(command) => registration.with_slash_command(command),
        None => registration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loader() -> (ManifestLoader, Arc<MountRegistry>) {
        let registry = Arc::new(MountRegistry::new());
        (ManifestLoader::new(Arc::clone(&registry)), registry)
    }

    #[test]
    fn mounts_are_flattened_with_overlays() {
        let (loader, registry) = loader();
        let report = loader
            .load_value(json!({
                "extensions": [{
                    "extensionId": "acme.summarize",
                    "template": {
                        "mounts": [
                            { "point": "EMAIL_VIEWER_TOOLBAR", "component": { "kind": "BUTTON" } },
                            { "mountPoint": "SIDEBAR", "priority": "HIGH", "component": "hi",
                              "slashCommand": { "name": "tldr", "actions": [] } }
                        ],
                        "overlays": { "summary": { "kind": "MARKDOWN" } }
                    }
                }]
            }))
            .unwrap();

        assert_eq!(report.loaded, vec!["acme.summarize"]);
        assert!(report.errors.is_empty());

        let sidebar = registry.by_mount_point(&MountPoint::Sidebar);
        assert_eq!(sidebar[0].priority(), Priority::High);
        assert_eq!(sidebar[0].extension_id(), "acme.summarize");
        assert_eq!(registry.slash_commands()[0].1.name, "tldr");

        let toolbar = registry.by_mount_point(&MountPoint::EmailViewerToolbar);
        match toolbar[0].contribution() {
            crate::Contribution::Manifest { overlays, .. } => assert!(overlays.contains_key("summary")),
            crate::Contribution::Native(_) => panic!("expected a manifest registration"),
        }
    }

    #[test]
    fn disabled_extensions_are_removed() {
        let (loader, registry) = loader();
        let installed = |enabled: bool| {
            json!({ "extensions": [{
                "extensionId": "acme.labels",
                "enabled": enabled,
                "template": { "mounts": [{ "point": "SIDEBAR", "component": "x" }] }
            }] })
        };

        loader.load_value(installed(true)).unwrap();
        assert!(registry.contains("acme.labels"));

        let report = loader.load_value(installed(false)).unwrap();
        assert_eq!(report.disabled, vec!["acme.labels"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn bad_entries_do_not_block_the_rest() {
        let (loader, registry) = loader();
        let report = loader
            .load_value(json!({ "extensions": [
                { "template": { "mounts": [] } },
                { "extensionId": "broken", "template": { "mounts": [{ "priority": "HIGH" }] } },
                { "extensionId": "ok", "template": { "mounts": [
                    { "point": "SETTINGS", "component": "x" },
                    { "point": "SETTINGS" }
                ] } }
            ] }))
            .unwrap();

        assert_eq!(report.loaded, vec!["ok"]);
        assert_eq!(report.errors.len(), 3);
        assert!(matches!(report.errors[0], RegistryError::MissingExtensionId { index: 0 }));
        assert!(!registry.contains("broken"));
        assert_eq!(registry.by_mount_point(&MountPoint::Settings).len(), 1);
    }

    #[test]
    fn invalid_documents_are_errors() {
        let (loader, _) = loader();
        assert!(matches!(
            loader.load_str("{ \"extensions\": 3 }"),
            Err(RegistryError::InvalidDocument(_))
        ));
    }
}
