//! Service-level error classification

use avanza_fetcher::FetcherError;
use mqtt_publisher::PublishError;
use std::time::Duration;
use thiserror::Error;

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Credentials or one-time code rejected
    #[error("Authentication failed: {0}")]
    Auth(FetcherError),

    /// Bus connect or publish failure
    #[error("Transport error: {0}")]
    Transport(#[from] PublishError),

    /// Account data provider failure
    #[error("Upstream error: {0}")]
    Upstream(FetcherError),

    #[error("Cycle exceeded {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ServiceError {
    /// True when the provider session has to be re-established
    pub fn needs_login(&self) -> bool {
        matches!(self, ServiceError::Upstream(e) if e.needs_login())
    }
}

impl From<FetcherError> for ServiceError {
    fn from(error: FetcherError) -> Self {
        if error.is_auth_failure() {
            ServiceError::Auth(error)
        } else {
            ServiceError::Upstream(error)
        }
    }
}
