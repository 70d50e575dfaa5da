//! Message bus seam

use crate::error::Result;
use async_trait::async_trait;

/// The publishing side of a message bus
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish `payload` on `topic`; retained messages are replayed to new subscribers
    async fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<()>;

    /// Flush and close the connection
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

/// Writes every message to stdout as `topic payload`
#[derive(Debug, Default)]
pub struct StdoutBus;

#[async_trait]
impl MessageBus for StdoutBus {
    async fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<()> {
        if retained {
            println!("{} {}", topic, payload);
        } else {
            println!("{} (not retained) {}", topic, payload);
        }
        Ok(())
    }
}

#[async_trait]
impl<B: MessageBus + ?Sized> MessageBus for Box<B> {
    async fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<()> {
        (**self).publish(topic, payload, retained).await
    }

    async fn disconnect(&self) -> Result<()> {
        (**self).disconnect().await
    }
}
