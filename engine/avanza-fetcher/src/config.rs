use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Avanza account API client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvanzaConfig {
    /// Login username
    pub username: String,

    /// Login password
    pub password: String,

    /// Base32 TOTP secret registered for two-factor login
    pub secret: String,

    /// API base URL
    pub base_url: String,

    /// Session inactivity limit requested at login
    pub max_inactive_minutes: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for AvanzaConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            secret: String::new(),
            base_url: "https://www.avanza.se".to_string(),
            max_inactive_minutes: 1440,
            request_timeout_secs: 30,
        }
    }
}

impl AvanzaConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check that credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AvanzaConfig::default();
        assert_eq!(config.base_url, "https://www.avanza.se");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_has_credentials() {
        let config = AvanzaConfig {
            username: "user".to_string(),
            password: "pass".to_string(),
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            ..Default::default()
        };
        assert!(config.has_credentials());
    }
}
