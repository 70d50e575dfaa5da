//! MQTT implementation of the message bus

use crate::bus::MessageBus;
use crate::config::MqttConfig;
use crate::error::{PublishError, Result};
use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Connected MQTT client; the event loop runs on a background task
pub struct MqttBus {
    client: AsyncClient,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttBus {
    /// Connect and wait for the broker's acknowledgement
    pub async fn connect(config: &MqttConfig) -> Result<Self> {
        let mut options =
            MqttOptions::new(config.client_id.clone(), config.broker_host(), config.port);
        options.set_keep_alive(config.keep_alive());
        if !config.username.is_empty() {
            options.set_credentials(config.username.clone(), config.password.clone());
        }

        let (client, mut event_loop) = AsyncClient::new(options, config.channel_capacity);

        timeout(config.connect_timeout(), wait_for_connack(&mut event_loop))
            .await
            .map_err(|_| PublishError::ConnectTimeout(config.connect_timeout()))??;

        info!("Connected to MQTT broker {}:{}", config.broker_host(), config.port);

        let event_loop = tokio::spawn(drive_event_loop(event_loop));
        Ok(Self { client, event_loop: Mutex::new(Some(event_loop)) })
    }

    fn take_event_loop(&self) -> Option<JoinHandle<()>> {
        self.event_loop.lock().ok().and_then(|mut handle| handle.take())
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<()> {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(PublishError::Connect(format!("broker refused connection: {:?}", ack.code)))
                };
            }
            Ok(event) => trace!("MQTT event before connack: {:?}", event),
            Err(e) => return Err(PublishError::Connect(e.to_string())),
        }
    }
}

/// Poll until the DISCONNECT packet has been written
async fn drive_event_loop(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => info!("Reconnected to MQTT broker"),
            Ok(event) if ends_session(&event) => {
                debug!("Disconnect sent, stopping MQTT event loop");
                break;
            }
            Ok(event) => trace!("MQTT event: {:?}", event),
            Err(e) => {
                warn!("MQTT connection error: {}, retrying in {:?}", e, RECONNECT_DELAY);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

fn ends_session(event: &Event) -> bool {
    matches!(event, Event::Outgoing(Outgoing::Disconnect))
}

#[async_trait]
impl MessageBus for MqttBus {
    async fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<()> {
        debug!("Publishing {} bytes to {} (retained: {})", payload.len(), topic, retained);
        self.client
            .publish(topic, QoS::AtLeastOnce, retained, payload.as_bytes().to_vec())
            .await?;
        Ok(())
    }

    /// Queue DISCONNECT and give the event loop a bounded time to send it
    async fn disconnect(&self) -> Result<()> {
        self.client.disconnect().await?;

        if let Some(mut handle) = self.take_event_loop() {
            if timeout(DISCONNECT_GRACE, &mut handle).await.is_err() {
                warn!("MQTT event loop did not stop within {:?}", DISCONNECT_GRACE);
                handle.abort();
            }
        }
        Ok(())
    }
}

impl Drop for MqttBus {
    fn drop(&mut self) {
        if let Some(handle) = self.take_event_loop() {
            handle.abort();
        }
    }
}
