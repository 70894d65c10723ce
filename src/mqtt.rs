//! MQTT publishing

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};

use crate::{config::MqttConfig, errors::TidePublisherError, models::TidePayload};

/// Topic Home Assistant reads the tide state from.
pub const STATE_TOPIC: &str = "homeassistant/sensor/tide_table/state";

const CLIENT_ID: &str = "tide-publisher";

/// Sink for assembled tide payloads
#[async_trait]
pub trait StatePublisher: Send + Sync {
    /// Deliver one payload to the configured sink.
    async fn publish(&self, payload: &TidePayload) -> Result<(), TidePublisherError>;
}

/// Publisher delivering payloads to an MQTT broker
pub struct MqttPublisher {
    config: MqttConfig,
}

impl MqttPublisher {
    /// Create a new MQTT publisher
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> MqttOptions {
        let mut mqtt_options =
            MqttOptions::new(CLIENT_ID, &self.config.broker, self.config.port);
        mqtt_options.set_keep_alive(Duration::from_secs(5));
        if let Some((user, pass)) = self.config.credentials() {
            mqtt_options.set_credentials(user, pass);
        }
        mqtt_options
    }
}

#[async_trait]
impl StatePublisher for MqttPublisher {
    /// Publish the payload and wait until the broker acknowledges it
    ///
    /// The connection is torn down once the acknowledgement arrives; every
    /// run is a single publish.
    async fn publish(&self, payload: &TidePayload) -> Result<(), TidePublisherError> {
        let body = serde_json::to_vec(payload)?;

        info!(
            "Publishing tide state to {}:{} on {}",
            self.config.broker, self.config.port, STATE_TOPIC
        );
        let (client, mut event_loop) = AsyncClient::new(self.options(), 10);
        client
            .publish(STATE_TOPIC, QoS::AtLeastOnce, false, body)
            .await?;

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    debug!("Connected to MQTT broker");
                }
                Ok(Event::Incoming(Packet::PubAck(_))) => {
                    info!("Broker acknowledged tide state");
                    client.disconnect().await?;
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => continue,
                Err(e) => {
                    error!("MQTT error: {}", e);
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }
}
