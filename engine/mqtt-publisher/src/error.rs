//! Error types for the publisher

use thiserror::Error;

/// Result type for publishing operations
pub type Result<T> = std::result::Result<T, PublishError>;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to connect to broker: {0}")]
    Connect(String),

    #[error("Broker did not acknowledge the connection within {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Bus error: {0}")]
    Bus(String),
}
