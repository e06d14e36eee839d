//! Mount points and priorities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A host slot that extensions can contribute to.
///
/// Names are `SCREAMING_SNAKE_CASE` in manifests. Names this version does not
/// know are kept as [`MountPoint::Custom`] so newer manifests still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MountPoint {
    /// Buttons above the message editor.
    ComposerToolbar,
    /// Panel beside the message editor.
    ComposerSidebar,
    /// Area above an opened message.
    EmailViewerHeader,
    /// Buttons on an opened message.
    EmailViewerToolbar,
    /// Area below an opened message.
    EmailViewerFooter,
    /// The main application sidebar.
    Sidebar,
    /// The extension's settings page.
    Settings,
    /// Pipeline run on an outgoing message before it is sent.
    PreSend,
    /// Any other slot.
    Custom(String),
}

impl MountPoint {
    /// Parses a mount-point name. Never fails.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "COMPOSER_TOOLBAR" => Self::ComposerToolbar,
            "COMPOSER_SIDEBAR" => Self::ComposerSidebar,
            "EMAIL_VIEWER_HEADER" => Self::EmailViewerHeader,
            "EMAIL_VIEWER_TOOLBAR" => Self::EmailViewerToolbar,
            "EMAIL_VIEWER_FOOTER" => Self::EmailViewerFooter,
            "SIDEBAR" => Self::Sidebar,
            "SETTINGS" => Self::Settings,
            "PRE_SEND" => Self::PreSend,
            _ => Self::Custom(name.trim().to_string()),
        }
    }

    /// Returns the manifest name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ComposerToolbar => "COMPOSER_TOOLBAR",
            Self::ComposerSidebar => "COMPOSER_SIDEBAR",
            Self::EmailViewerHeader => "EMAIL_VIEWER_HEADER",
            Self::EmailViewerToolbar => "EMAIL_VIEWER_TOOLBAR",
            Self::EmailViewerFooter => "EMAIL_VIEWER_FOOTER",
            Self::Sidebar => "SIDEBAR",
            Self::Settings => "SETTINGS",
            Self::PreSend => "PRE_SEND",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for MountPoint {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<&str> for MountPoint {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<MountPoint> for String {
    fn from(point: MountPoint) -> Self {
        match point {
            MountPoint::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution priority at a pipeline mount point.
///
/// Ordered `High > Normal > Low > Monitor`. Monitors observe the pipeline
/// value but can neither change it nor stop the pipeline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Read-only observer; runs last.
    #[serde(alias = "monitor")]
    Monitor = 0,
    /// Runs after normal handlers.
    #[serde(alias = "low")]
    Low = 1,
    /// The default.
    #[default]
    #[serde(alias = "normal")]
    Normal = 2,
    /// Runs first.
    #[serde(alias = "high")]
    High = 3,
}

impl Priority {
    /// Returns the numeric rank (`High` = 3 ... `Monitor` = 0).
    #[must_use]
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Returns `true` for [`Priority::Monitor`].
    #[must_use]
    pub fn is_monitor(self) -> bool {
        self == Self::Monitor
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Monitor => "MONITOR",
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip_through_serde() {
        let point: MountPoint = serde_json::from_value(json!("composer-toolbar")).unwrap();
        assert_eq!(point, MountPoint::ComposerToolbar);
        assert_eq!(serde_json::to_value(&point).unwrap(), json!("COMPOSER_TOOLBAR"));

        let custom: MountPoint = serde_json::from_value(json!("CALENDAR_PANE")).unwrap();
        assert_eq!(custom, MountPoint::Custom("CALENDAR_PANE".into()));
        assert_eq!(custom.to_string(), "CALENDAR_PANE");
    }

    #[test]
    fn priorities_order_by_rank() {
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Low > Priority::Monitor);
        assert_eq!(Priority::High.rank(), 3);
        assert_eq!(Priority::default(), Priority::Normal);
        let parsed: Priority = serde_json::from_value(json!("high")).unwrap();
        assert_eq!(parsed, Priority::High);
    }
}
