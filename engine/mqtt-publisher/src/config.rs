use serde::{Deserialize, Serialize};
use std::time::Duration;

/// MQTT broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker host; a leading `mqtt://` or `tcp://` is ignored
    pub host: String,

    pub port: u16,

    /// Username (credentials are only sent when non-empty)
    pub username: String,

    pub password: String,

    pub client_id: String,

    /// Keep-alive interval in seconds
    pub keep_alive_secs: u64,

    /// How long to wait for the broker to acknowledge the connection
    pub connect_timeout_secs: u64,

    /// Capacity of the outgoing request queue
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: String::new(),
            password: String::new(),
            client_id: format!("avanza-mqtt-{}", std::process::id()),
            keep_alive_secs: 30,
            connect_timeout_secs: 10,
            channel_capacity: 64,
        }
    }
}

impl MqttConfig {
    /// Host with any URL scheme removed
    pub fn broker_host(&self) -> &str {
        let host = self.host.trim();
        host.strip_prefix("mqtt://")
            .or_else(|| host.strip_prefix("tcp://"))
            .unwrap_or(host)
            .trim_end_matches('/')
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(5))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
