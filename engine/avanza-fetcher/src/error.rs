//! Error types for the Avanza fetcher

use thiserror::Error;

/// Result type for fetcher operations
pub type Result<T> = std::result::Result<T, FetcherError>;

/// Errors returned by the account data provider
#[derive(Error, Debug)]
pub enum FetcherError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session expired")]
    SessionExpired,

    #[error("Rate limited on {endpoint}")]
    RateLimited { endpoint: String },

    #[error("Request to {endpoint} failed with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("TOTP error: {0}")]
    Totp(String),
}

impl FetcherError {
    /// True when the provider rejected the credentials or the one-time code
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, FetcherError::AuthenticationFailed(_) | FetcherError::Totp(_))
    }

    /// True when a fresh login is needed before further data calls
    pub fn needs_login(&self) -> bool {
        matches!(self, FetcherError::SessionExpired | FetcherError::NotAuthenticated)
    }
}
