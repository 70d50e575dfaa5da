//! Avanza MQTT Service
//!
//! Logs in to Avanza, connects to the MQTT broker and publishes account, position and
//! watchlist summaries until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use avanza_fetcher::{AvanzaClient, SnapshotFetcher};
use mqtt_publisher::{ChangeGatedPublisher, MessageBus, MqttBus, StdoutBus};
use poll_service::{
    initialize_logging, load_with_cli, setup_signal_handlers, Cli, PollDriver, ServiceError,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Configuration errors are fatal before any external call
    let config = load_with_cli(&cli).context("Failed to load configuration")?;
    initialize_logging(config.log_level(), &config.logging.format)?;

    info!("Starting avanza-mqtt v{}", env!("CARGO_PKG_VERSION"));

    let bus: Box<dyn MessageBus> = if cli.dry_run {
        info!("Dry run, printing messages to stdout");
        Box::new(StdoutBus)
    } else {
        let bus = MqttBus::connect(&config.mqtt)
            .await
            .map_err(ServiceError::from)
            .context("Failed to connect to MQTT broker")?;
        Box::new(bus)
    };

    let client = AvanzaClient::new(config.avanza.clone()).context("Failed to build Avanza client")?;
    let mut driver =
        PollDriver::new(SnapshotFetcher::new(client), ChangeGatedPublisher::new(bus), config);

    driver.authenticate().await.context("Failed to log in to Avanza")?;

    if cli.once {
        let report = driver.run_once().await.context("Cycle did not complete")?;
        if !report.is_success() {
            warn!("Pipelines failed: {:?}", report.failed_pipelines);
        }
    } else {
        let shutdown = setup_signal_handlers()?;
        info!("avanza-mqtt is running. Press Ctrl+C to shutdown gracefully.");
        driver.run(shutdown).await;
    }

    driver.shutdown().await;
    info!("avanza-mqtt shutdown complete");
    Ok(())
}
