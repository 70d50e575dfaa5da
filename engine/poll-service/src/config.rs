//! Service configuration management
//!
//! Layers, lowest precedence first: built-in defaults, the configuration file, environment
//! variables prefixed `AVANZA_MQTT__` (nested keys separated by `__`), command line flags.

use anyhow::{Context, Result};
use avanza_fetcher::AvanzaConfig;
use config::{Config, Environment, File};
use mqtt_publisher::MqttConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use summary_reshaper::RoundingConfig;

use crate::cli::Cli;
use crate::error::ServiceError;
use crate::pipeline::Pipeline;

const ENV_PREFIX: &str = "AVANZA_MQTT";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Debug logging plus raw account echo topics
    pub debug: bool,

    /// Poll interval in minutes
    pub interval: u64,

    /// Root topic
    pub topic: String,

    /// Pipelines run each cycle, in order
    pub pipelines: Vec<Pipeline>,

    /// Upper bound for one whole cycle in seconds
    pub cycle_timeout_secs: u64,

    pub avanza: AvanzaConfig,

    pub mqtt: MqttConfig,

    pub rounding: RoundingConfig,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, pretty, json)
    pub format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            debug: false,
            interval: 1,
            topic: "Avanza".to_string(),
            pipelines: Pipeline::default_set(),
            cycle_timeout_secs: 300,
            avanza: AvanzaConfig::default(),
            mqtt: MqttConfig::default(),
            rounding: RoundingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl ServiceConfig {
    /// Get poll interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.saturating_mul(60))
    }

    /// Get cycle timeout as Duration
    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    /// Effective log level; debug mode forces `debug`
    pub fn log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.logging.level
        }
    }

    /// Apply command line flags on top of file and environment values
    pub fn apply_cli(&mut self, cli: &Cli) {
        if cli.debug {
            self.debug = true;
        }
        if let Some(interval) = cli.interval {
            self.interval = interval;
        }
        if let Some(topic) = &cli.topic {
            self.topic = topic.clone();
        }
    }

    /// Reject values the driver cannot run with
    pub fn validate(&self, require_credentials: bool) -> std::result::Result<(), ServiceError> {
        if self.interval == 0 {
            return Err(ServiceError::Config("interval must be at least 1 minute".to_string()));
        }

        if self.topic.trim().trim_matches('/').is_empty() {
            return Err(ServiceError::Config("topic must not be empty".to_string()));
        }

        if self.pipelines.is_empty() {
            return Err(ServiceError::Config("at least one pipeline is required".to_string()));
        }

        if self.cycle_timeout_secs == 0 {
            return Err(ServiceError::Config("cycle_timeout_secs must be positive".to_string()));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            level => return Err(ServiceError::Config(format!("invalid log level: {}", level))),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" | "json" => {}
            format => return Err(ServiceError::Config(format!("invalid log format: {}", format))),
        }

        if require_credentials && !self.avanza.has_credentials() {
            return Err(ServiceError::Config(
                "avanza.username, avanza.password and avanza.secret are required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load configuration from the file at `path` (optional) and the environment
pub fn load_config(path: &Path) -> Result<ServiceConfig> {
    load_layered(path, ENV_PREFIX)
}

// Environment values stay strings; numeric fields are converted during deserialization, so
// secrets such as `007` keep their leading zeros.
fn load_layered(path: &Path, env_prefix: &str) -> Result<ServiceConfig> {
    let config = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(Environment::with_prefix(env_prefix).separator("__"))
        .build()
        .with_context(|| format!("Failed to read configuration from {:?}", path))?;

    config.try_deserialize().context("Failed to parse configuration")
}

/// Load, apply CLI overrides and validate
pub fn load_with_cli(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = load_config(&cli.config)?;
    config.apply_cli(cli);
    config.validate(true)?;
    Ok(config)
}
