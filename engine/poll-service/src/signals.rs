//! Signal handling for graceful shutdown

use anyhow::{Context, Result};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Setup Ctrl+C and SIGTERM handlers
///
/// The returned future resolves once either signal arrives.
pub fn setup_signal_handlers() -> Result<impl Future<Output = ()>> {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    // Handle Ctrl+C (SIGINT)
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C signal: {}", e);
                return;
            }

            info!("Ctrl+C signal received");
            let _ = shutdown_tx.try_send(());
        });
    }

    // Handle SIGTERM (Unix only)
    #[cfg(unix)]
    {
        use signal_hook::consts::SIGTERM;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown_flag))
            .context("Failed to register SIGTERM handler")?;

        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    info!("SIGTERM signal received");
                    let _ = shutdown_tx.try_send(());
                    break;
                }
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            }
        });
    }

    drop(shutdown_tx);

    Ok(async move {
        // Both senders gone without a signal only if every handler failed to install
        if shutdown_rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    })
}
