//! MQTT broker adapter.
//!
//! Implements [`BrokerPort`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   The client runs its own task; its event callback feeds the static
//!   inbound queue and link flag in [`crate::rpc::channels`], which
//!   [`BrokerPort::poll`] drains.
//! - **all other targets**: loopback simulation. Publishes to a subscribed
//!   topic are delivered back through `poll`, everything else is logged.

use log::info;

use crate::app::ports::{BrokerPort, InboundMessage, Qos, SessionOptions};
use crate::error::CommsError;

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

pub struct MqttAdapter {
    url: String,
    connect_timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimBroker {
    connected: bool,
    subscriptions: Vec<String>,
    inbox: VecDeque<InboundMessage>,
}

impl MqttAdapter {
    pub fn new(url: &str, connect_timeout_ms: u32) -> Self {
        Self {
            url: url.to_string(),
            connect_timeout_ms,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // ── ESP-IDF ───────────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, options: &SessionOptions) -> Result<(), CommsError> {
        use core::time::Duration;
        use esp_idf_svc::hal::delay::FreeRtos;
        use esp_idf_svc::mqtt::client::{
            EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration,
        };

        use crate::rpc::channels;

        self.client = None;
        channels::set_link_up(false);

        let conf = MqttClientConfiguration {
            client_id: Some(&options.client_id),
            username: options.username.as_deref(),
            password: options.password.as_deref(),
            keep_alive_interval: Some(Duration::from_secs(u64::from(options.keep_alive_secs))),
            network_timeout: Duration::from_millis(u64::from(self.connect_timeout_ms)),
            lwt: Some(LwtConfiguration {
                topic: &options.last_will.topic,
                payload: options.last_will.payload.as_bytes(),
                qos: esp_qos(options.last_will.qos),
                retain: options.last_will.retain,
            }),
            ..Default::default()
        };

        let client = EspMqttClient::new_cb(&self.url, &conf, |event| match event.payload() {
            EventPayload::Connected(_) => channels::set_link_up(true),
            EventPayload::Disconnected => channels::set_link_up(false),
            EventPayload::Received {
                topic: Some(topic),
                data,
                ..
            } => {
                if !channels::enqueue_inbound(topic, data) {
                    log::warn!("MQTT: inbound queue full or message too large, dropped");
                }
            }
            EventPayload::Error(e) => log::warn!("MQTT: client error: {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            log::warn!("MQTT: client init failed: {}", e);
            CommsError::ConnectFailed
        })?;
        self.client = Some(client);

        let mut waited = 0;
        while !channels::link_up() {
            if waited >= self.connect_timeout_ms {
                self.client = None;
                return Err(CommsError::ConnectFailed);
            }
            FreeRtos::delay_ms(50);
            waited += 50;
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        self.client = None;
        crate::rpc::channels::set_link_up(false);
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.client.is_some() && crate::rpc::channels::link_up()
    }

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::Disconnected)?;
        client
            .subscribe(topic, esp_qos(qos))
            .map(|_| ())
            .map_err(|_| CommsError::SubscribeFailed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
        qos: Qos,
    ) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::Disconnected)?;
        client
            .publish(topic, esp_qos(qos), retain, payload)
            .map(|_| ())
            .map_err(|_| CommsError::PublishFailed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self) -> Result<Option<InboundMessage>, CommsError> {
        if !self.platform_is_connected() {
            return Err(CommsError::Disconnected);
        }
        Ok(crate::rpc::channels::next_inbound())
    }

    // ── Simulation ────────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, options: &SessionOptions) -> Result<(), CommsError> {
        info!(
            "MQTT(sim): {} connected to {} (timeout {} ms)",
            options.client_id, self.url, self.connect_timeout_ms
        );
        self.sim = SimBroker {
            connected: true,
            ..SimBroker::default()
        };
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim.connected = false;
        self.sim.subscriptions.clear();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.connected
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&mut self, topic: &str, _qos: Qos) -> Result<(), CommsError> {
        if !self.sim.connected {
            return Err(CommsError::Disconnected);
        }
        self.sim.subscriptions.push(topic.to_string());
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
        _qos: Qos,
    ) -> Result<(), CommsError> {
        if !self.sim.connected {
            return Err(CommsError::Disconnected);
        }
        info!(
            "MQTT(sim): publish {} ({} bytes{})",
            topic,
            payload.len(),
            if retain { ", retained" } else { "" }
        );
        if self.sim.subscriptions.iter().any(|s| s == topic) {
            let msg = InboundMessage::new(topic, payload).ok_or(CommsError::PublishFailed)?;
            self.sim.inbox.push_back(msg);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self) -> Result<Option<InboundMessage>, CommsError> {
        if !self.sim.connected {
            return Err(CommsError::Disconnected);
        }
        Ok(self.sim.inbox.pop_front())
    }
}

#[cfg(target_os = "espidf")]
fn esp_qos(qos: Qos) -> esp_idf_svc::mqtt::client::QoS {
    use esp_idf_svc::mqtt::client::QoS;
    match qos {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
    }
}

impl BrokerPort for MqttAdapter {
    type Error = CommsError;

    fn connect(&mut self, options: &SessionOptions) -> Result<(), CommsError> {
        self.platform_connect(options)
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        info!("MQTT: disconnected from {}", self.url);
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), CommsError> {
        self.platform_subscribe(topic, qos)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool, qos: Qos) -> Result<(), CommsError> {
        self.platform_publish(topic, payload, retain, qos)
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, CommsError> {
        self.platform_poll()
    }
}
