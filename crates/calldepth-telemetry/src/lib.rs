//! # calldepth-telemetry
//!
//! The production backend for calldepth: [`TracingHandler`] relays records to
//! `tracing`, and [`init_telemetry`] installs a `tracing-subscriber` pipeline
//! to print them.

mod error;
mod handler;

pub use error::{Result, TelemetryError};
pub use handler::{TracingHandler, TARGET};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the subscriber pipeline.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "calldepth" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: true,
        }
    }
}

impl TelemetryConfig {
    /// Sets the level for `module`, replacing an earlier override for it.
    #[must_use]
    pub fn with_module_level(mut self, module: impl Into<String>, level: Level) -> Self {
        let module = module.into();
        if let Some(entry) = self.module_levels.iter_mut().find(|(m, _)| *m == module) {
            entry.1 = level;
        } else {
            self.module_levels.push((module, level));
        }
        self
    }

    /// JSON lines when `true`, human-readable otherwise.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// `EnvFilter` directives equivalent to this config, e.g. `info,calldepth=debug`.
    pub fn filter_directives(&self) -> String {
        let mut filter = self.log_level.to_string().to_lowercase();
        for (module, level) in &self.module_levels {
            filter.push(',');
            filter.push_str(module);
            filter.push('=');
            filter.push_str(&level.to_string().to_lowercase());
        }
        filter
    }
}

fn build_filter(directives: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_new(directives)?)
}

/// Install the global subscriber. Call once at startup.
///
/// RUST_LOG wins over the configured levels when it is set and parses.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.filter_directives())?,
    };

    // The event's own file/line is the relay inside TracingHandler, so leave it
    // out; the caller's location is carried in the `source` field.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    let result = if config.json {
        tracing_subscriber::registry()
            .with(fmt_layer.json().with_filter(env_filter))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer.with_filter(env_filter))
            .try_init()
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))
}
