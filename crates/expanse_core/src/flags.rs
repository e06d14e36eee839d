//! Per-extension feature flags.
//!
//! Code-defined expansions are compiled into the host but only registered
//! when their flag is on. A flag for extension id `acme.signature` is read
//! from `EXPANSE_FEATURE_ACME_SIGNATURE`.

use std::collections::BTreeMap;

/// Prefix of feature flag variables.
pub const FEATURE_PREFIX: &str = "EXPANSE_FEATURE_";

/// Resolved feature flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    flags: BTreeMap<String, bool>,
    default_enabled: bool,
}

impl FeatureFlags {
    /// Creates an empty flag set where every extension is disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flag set where every extension is enabled unless turned off.
    #[must_use]
    pub fn all_enabled() -> Self {
        Self {
            flags: BTreeMap::new(),
            default_enabled: true,
        }
    }

    /// Reads flags from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Reads flags from an explicit list of variables.
    ///
    /// Only variables with the [`FEATURE_PREFIX`] are considered. Values
    /// `1`, `true`, `on` and `yes` (any case) enable; anything else disables.
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let flags = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let name = key.as_ref().strip_prefix(FEATURE_PREFIX)?;
                Some((name.to_string(), is_truthy_flag(value.as_ref())))
            })
            .collect();
        Self {
            flags,
            default_enabled: false,
        }
    }

    /// Sets the value used for extensions without an explicit flag.
    #[must_use]
    pub fn with_default(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Explicitly enables or disables one extension.
    #[must_use]
    pub fn with_flag(mut self, extension_id: &str, enabled: bool) -> Self {
        self.flags.insert(flag_name(extension_id), enabled);
        self
    }

    /// Returns whether the extension is enabled.
    #[must_use]
    pub fn is_enabled(&self, extension_id: &str) -> bool {
        self.flags
            .get(&flag_name(extension_id))
            .copied()
            .unwrap_or(self.default_enabled)
    }
}

/// Returns the environment variable that controls an extension.
#[must_use]
pub fn flag_variable(extension_id: &str) -> String {
    format!("{FEATURE_PREFIX}{}", flag_name(extension_id))
}

fn flag_name(extension_id: &str) -> String {
    extension_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn is_truthy_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
