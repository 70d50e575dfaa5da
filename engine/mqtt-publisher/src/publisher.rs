//! Publish-on-change gate in front of a message bus

use crate::bus::MessageBus;
use crate::cache::PublishCache;
use crate::error::Result;
use crate::topic::TopicPath;
use serde::Serialize;
use tracing::{debug, trace};

/// What happened to a gated publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Payload differed from the cached one (or nothing was cached) and went to the bus
    Published,
    /// Payload matched the cached one; no bus call was made
    Skipped,
}

/// Sends a record only when its serialized form changed since the last publish
///
/// Publishing takes `&mut self`, so a single owner serializes all access to the cache.
pub struct ChangeGatedPublisher<B> {
    bus: B,
    cache: PublishCache,
}

impl<B: MessageBus> ChangeGatedPublisher<B> {
    /// Create a publisher with an empty cache
    pub fn new(bus: B) -> Self {
        Self { bus, cache: PublishCache::new() }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn cache(&self) -> &PublishCache {
        &self.cache
    }

    /// Serialize `record` and publish it retained under `topic` if it changed
    pub async fn publish<T: Serialize + ?Sized>(
        &mut self,
        topic: &TopicPath,
        record: &T,
    ) -> Result<PublishOutcome> {
        let payload = serde_json::to_string(record)?;
        self.publish_payload(topic.as_str(), payload).await
    }

    /// Publish pre-serialized text under `key` if it changed
    ///
    /// The cache is only updated once the bus accepted the message, so a failed
    /// publish is retried on the next cycle.
    pub async fn publish_payload(&mut self, key: &str, payload: String) -> Result<PublishOutcome> {
        if self.cache.is_unchanged(key, &payload) {
            trace!("Skipping unchanged payload for {}", key);
            return Ok(PublishOutcome::Skipped);
        }

        self.bus.publish(key, &payload, true).await?;
        debug!("Published {}: {}", key, payload);
        self.cache.store(key, payload);

        Ok(PublishOutcome::Published)
    }

    /// Publish without consulting or touching the cache
    pub async fn publish_untracked(
        &self,
        topic: &TopicPath,
        payload: &str,
        retained: bool,
    ) -> Result<()> {
        self.bus.publish(topic.as_str(), payload, retained).await
    }
}
