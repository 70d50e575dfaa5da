//! Avanza MQTT Poll Service Library
//!
//! Process shell around the poll driver: configuration layering, command line flags,
//! logging, signal handling, and the [`PollDriver`] that runs fetch, reshape and publish
//! pipelines on a fixed interval.

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod signals;

pub use cli::Cli;
pub use config::{load_config, load_with_cli, LoggingConfig, ServiceConfig};
pub use driver::{CycleReport, DriverState, PollDriver};
pub use error::{Result, ServiceError};
pub use logging::initialize_logging;
pub use pipeline::Pipeline;
pub use signals::setup_signal_handlers;
