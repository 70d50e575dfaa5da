//! Command line interface

use clap::Parser;
use std::path::PathBuf;

/// Publish Avanza account summaries to MQTT
#[derive(Debug, Clone, Parser)]
#[command(name = "avanza-mqtt", version)]
#[command(about = "Polls Avanza account data and publishes change-gated summaries to MQTT")]
pub struct Cli {
    /// Configuration file (toml, json or yaml); the extension may be omitted
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,

    /// Debug logging and raw account echo topics
    #[arg(short, long)]
    pub debug: bool,

    /// Poll interval in minutes
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Root topic
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Print messages to stdout instead of connecting to the broker
    #[arg(long)]
    pub dry_run: bool,
}
