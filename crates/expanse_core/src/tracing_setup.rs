//! Log output for a host embedding Expanse.
//!
//! Every Expanse crate logs through the `tracing` facade. [`TracingConfig`]
//! installs a subscriber that shows the runtime's own targets at the chosen
//! level and keeps dependencies quiet:
//!
//! ```text
//! warn,expanse_template=info,expanse_actions=info,expanse_render=info,expanse_registry=info,expanse_core=info
//! ```
//!
//! Host crates can add their own targets with
//! [`with_host_target`](TracingConfig::with_host_target), and an explicit
//! filter replaces the generated one entirely.
//!
//! # Example
//!
//! ```
//! use expanse_core::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! // Trace what manifests do while developing an extension.
//! let dev = TracingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_host_target("webmail");
//! assert!(dev.filter_directives().contains("expanse_actions=debug"));
//!
//! // One JSON line per render problem or failed action.
//! TracingConfig::new()
//!     .with_format(TracingFormat::Json)
//!     .with_env_filter("warn,expanse_render=warn,expanse_actions=info")
//!     .init();
//! ```

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Log targets of the Expanse runtime crates.
pub const RUNTIME_TARGETS: &[&str] = &[
    "expanse_template",
    "expanse_actions",
    "expanse_render",
    "expanse_registry",
    "expanse_core",
];

/// Filter override, in `target=level` directive syntax.
pub const LOG_VAR: &str = "EXPANSE_LOG";

/// Output format override: `pretty`, `compact` or `json`.
pub const LOG_FORMAT_VAR: &str = "EXPANSE_LOG_FORMAT";

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line output for a developer terminal.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl TracingFormat {
    /// Parses a format name, ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Subscriber configuration.
///
/// `init()` uses `try_init`, so calling it more than once (for example from
/// several tests) leaves the first subscriber in place.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    level: Level,
    format: TracingFormat,
    host_targets: Vec<String>,
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            host_targets: Vec::new(),
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads [`LOG_VAR`] and [`LOG_FORMAT_VAR`] over the defaults.
    ///
    /// An unknown format name keeps the default format.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(filter) = std::env::var(LOG_VAR)
            && !filter.trim().is_empty()
        {
            config.env_filter = Some(filter);
        }
        if let Some(format) = std::env::var(LOG_FORMAT_VAR)
            .ok()
            .as_deref()
            .and_then(TracingFormat::parse)
        {
            config.format = format;
        }
        config
    }

    /// Sets the level for Expanse and host targets.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Logs `target` at the configured level alongside the runtime crates.
    #[must_use]
    pub fn with_host_target(mut self, target: impl Into<String>) -> Self {
        self.host_targets.push(target.into());
        self
    }

    /// Replaces the generated filter.
    ///
    /// An invalid filter falls back to the generated one.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events, which shows every dispatch and chain run.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Returns the filter directives `init()` installs.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        if let Some(filter) = &self.env_filter {
            return filter.clone();
        }
        self.generated_directives()
    }

    fn generated_directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        let mut directives = vec!["warn".to_string()];
        directives.extend(
            RUNTIME_TARGETS
                .iter()
                .copied()
                .chain(self.host_targets.iter().map(String::as_str))
                .map(|target| format!("{target}={level}")),
        );
        directives.join(",")
    }

    /// Installs the global subscriber.
    pub fn init(&self) {
        let env_filter = EnvFilter::try_new(self.filter_directives())
            .unwrap_or_else(|_| EnvFilter::new(self.generated_directives()));

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let output = tracing_subscriber::fmt::layer().with_span_events(span_events);
        let output: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            TracingFormat::Pretty => output.pretty().boxed(),
            TracingFormat::Compact => output.compact().boxed(),
            TracingFormat::Json => output.json().boxed(),
        };

        // Already initialized: keep the first subscriber.
        if tracing_subscriber::registry()
            .with(output)
            .with(env_filter)
            .try_init()
            .is_ok()
        {
            tracing::debug!(
                filter = %self.filter_directives(),
                format = ?self.format,
                "expanse tracing initialized"
            );
        }
    }
}
