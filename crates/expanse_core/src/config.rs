//! Runtime configuration shared by the interpreter and the dispatcher.
//!
//! [`RuntimeConfig`] carries the host-approved `env` namespace and the safety
//! limits that keep malformed manifests from running away. It is built once at
//! startup, either programmatically or from process environment variables,
//! and handed to each surface.
//!
//! # Environment Variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `EXPANSE_PUBLIC_<NAME>` | Exposed to manifests as `${env.<name>}` (lower-cased) |
//! | `EXPANSE_MAX_RENDER_DEPTH` | Nested node depth limit |
//! | `EXPANSE_MAX_REPEAT` | Item cap for `FOR_EACH`/`REPEAT` |
//! | `EXPANSE_MAX_DELAY_MS` | Upper bound for `DELAY` |
//! | `EXPANSE_MAX_ACTION_DEPTH` | Nesting limit for chained actions |

use core::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

/// Prefix of variables exposed through the `env` namespace.
pub const PUBLIC_ENV_PREFIX: &str = "EXPANSE_PUBLIC_";

/// Errors produced while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to something that does not parse.
    #[error("invalid value for {variable}: '{value}'")]
    InvalidValue {
        /// The offending variable name.
        variable: String,
        /// The raw value.
        value: String,
    },
}

/// Limits and environment values for one runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    env: Map<String, Value>,
    max_render_depth: usize,
    max_repeat: usize,
    max_delay: Duration,
    max_action_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            env: Map::new(),
            max_render_depth: Self::DEFAULT_MAX_RENDER_DEPTH,
            max_repeat: Self::DEFAULT_MAX_REPEAT,
            max_delay: Self::DEFAULT_MAX_DELAY,
            max_action_depth: Self::DEFAULT_MAX_ACTION_DEPTH,
        }
    }
}

impl RuntimeConfig {
    /// Default maximum depth of nested component nodes.
    pub const DEFAULT_MAX_RENDER_DEPTH: usize = 64;
    /// Default maximum number of items a repeat renders.
    pub const DEFAULT_MAX_REPEAT: usize = 1000;
    /// Default upper bound for a single `DELAY`.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
    /// Default maximum nesting of chained actions.
    pub const DEFAULT_MAX_ACTION_DEPTH: usize = 16;

    /// Creates a configuration with default limits and an empty `env`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a limit variable is not a
    /// non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Reads configuration from an explicit list of variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a limit variable is not a
    /// non-negative integer.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let key = key.as_ref();
            let value = value.into();
            if let Some(name) = key.strip_prefix(PUBLIC_ENV_PREFIX) {
                config
                    .env
                    .insert(name.to_ascii_lowercase(), Value::String(value));
                continue;
            }
            match key {
                "EXPANSE_MAX_RENDER_DEPTH" => config.max_render_depth = parse_limit(key, &value)?,
                "EXPANSE_MAX_REPEAT" => config.max_repeat = parse_limit(key, &value)?,
                "EXPANSE_MAX_DELAY_MS" => {
                    config.max_delay = Duration::from_millis(parse_limit(key, &value)? as u64);
                }
                "EXPANSE_MAX_ACTION_DEPTH" => config.max_action_depth = parse_limit(key, &value)?,
                _ => {}
            }
        }
        Ok(config)
    }

    /// Adds a value to the `env` namespace.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the nested node depth limit.
    #[must_use]
    pub fn with_max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = depth;
        self
    }

    /// Sets the repeat item cap.
    #[must_use]
    pub fn with_max_repeat(mut self, max: usize) -> Self {
        self.max_repeat = max;
        self
    }

    /// Sets the `DELAY` upper bound.
    #[must_use]
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = max;
        self
    }

    /// Sets the chained action nesting limit.
    #[must_use]
    pub fn with_max_action_depth(mut self, depth: usize) -> Self {
        self.max_action_depth = depth;
        self
    }

    /// Returns the `env` namespace as a JSON object.
    #[must_use]
    pub fn env(&self) -> Value {
        Value::Object(self.env.clone())
    }

    /// Returns the nested node depth limit.
    #[must_use]
    pub fn max_render_depth(&self) -> usize {
        self.max_render_depth
    }

    /// Returns the repeat item cap.
    #[must_use]
    pub fn max_repeat(&self) -> usize {
        self.max_repeat
    }

    /// Returns the `DELAY` upper bound.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Returns the chained action nesting limit.
    #[must_use]
    pub fn max_action_depth(&self) -> usize {
        self.max_action_depth
    }
}

fn parse_limit(variable: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            variable: variable.to_string(),
            value: value.to_string(),
        })
}
