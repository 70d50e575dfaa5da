//! MQTT Publisher
//!
//! Publishes summary records to an MQTT broker, gated by a cache of the last payload sent
//! per topic so that bus traffic follows changes rather than poll cycles.

pub mod bus;
pub mod cache;
pub mod config;
pub mod error;
pub mod mqtt;
pub mod publisher;
pub mod topic;

pub use bus::{MessageBus, StdoutBus};
pub use cache::PublishCache;
pub use config::MqttConfig;
pub use error::{PublishError, Result};
pub use mqtt::MqttBus;
pub use publisher::{ChangeGatedPublisher, PublishOutcome};
pub use topic::TopicPath;
