//! MQTT bridge driver built on `rumqttc`.
//!
//! A single event loop task receives publishes from the broker, hands each
//! one to a [`MessageHandler`] and republishes whatever it returns.
//! Subscriptions are (re)issued on every `ConnAck` so they survive
//! reconnects with a clean session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use homie_hooks_core::{BridgeConfig, Message, MessageHandler, TopicFilter};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, SubscribeFilter};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::dispatch_counted;
use crate::error::{BridgeError, Result};
use crate::publisher::{qos_from_mqtt, qos_to_mqtt};
use crate::stats::BridgeStats;

/// Build client options from the bridge configuration.
pub fn mqtt_options(config: &BridgeConfig) -> Result<MqttOptions> {
    let client_id = match &config.client_id {
        Some(id) if id.is_empty() || id.starts_with(' ') => {
            return Err(BridgeError::InvalidClientId(id.clone()));
        }
        Some(id) => id.clone(),
        None => format!("homie-hooks-{}", Uuid::new_v4()),
    };

    let mut options = MqttOptions::new(client_id, &config.server_address, config.server_port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        options.set_credentials(user, pass);
    }
    Ok(options)
}

/// Bridge between the device bus and the hub bus on one broker.
pub struct MqttBridge<H> {
    handler: H,
    filters: Vec<TopicFilter>,
    subscription_qos: rumqttc::QoS,
    reconnect_delay: Duration,
    broker_addr: String,
    client: AsyncClient,
    eventloop: EventLoop,
    stats: Arc<BridgeStats>,
}

impl<H: MessageHandler> MqttBridge<H> {
    /// Create the client. No connection is made until [`run`](Self::run).
    pub fn new(config: &BridgeConfig, handler: H) -> Result<Self> {
        let filters = config.filters()?;
        let options = mqtt_options(config)?;
        let (client, eventloop) = AsyncClient::new(options, config.request_capacity.max(1));

        Ok(Self {
            handler,
            filters,
            subscription_qos: qos_to_mqtt(config.subscription_qos),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            broker_addr: config.broker_addr(),
            client,
            eventloop,
            stats: Arc::new(BridgeStats::new()),
        })
    }

    pub fn filters(&self) -> &[TopicFilter] {
        &self.filters
    }

    pub fn stats(&self) -> Arc<BridgeStats> {
        self.stats.clone()
    }

    /// Poll the broker until `shutdown` completes.
    ///
    /// Connection errors are logged and polling resumes after the
    /// configured delay; `rumqttc` reconnects on the next poll.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(category = "mqtt", "Connecting to MQTT broker {}", self.broker_addr);
        tokio::pin!(shutdown);

        'poll: loop {
            tokio::select! {
                _ = &mut shutdown => break 'poll,
                event = self.eventloop.poll() => match event {
                    Ok(event) => self.handle_event(event).await,
                    Err(e) => {
                        warn!(category = "mqtt", "MQTT broker {} error: {}", self.broker_addr, e);
                        tokio::select! {
                            _ = &mut shutdown => break 'poll,
                            _ = tokio::time::sleep(self.reconnect_delay) => {}
                        }
                    }
                },
            }
        }

        info!(category = "mqtt", "Shutting down MQTT bridge");
        if let Err(e) = self.client.try_disconnect() {
            debug!(category = "mqtt", "Disconnect request failed: {}", e);
        }
        self.stats.log_summary();
        Ok(())
    }

    async fn handle_event(&self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                info!(category = "mqtt", "rc: {:?}", ack.code);
                if let Err(e) = self.subscribe_all() {
                    warn!(category = "mqtt", "Failed to subscribe: {}", e);
                }
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                debug!(category = "mqtt", "Subscribed: {} {:?}", ack.pkid, ack.return_codes);
            }
            Event::Incoming(Packet::Publish(publish)) => {
                let message = Message {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                    qos: qos_from_mqtt(publish.qos),
                    retain: publish.retain,
                };
                info!(
                    category = "mqtt",
                    "{} {} {}",
                    message.topic,
                    u8::from(message.qos),
                    message.payload_lossy()
                );
                dispatch_counted(&self.handler, &self.client, &self.filters, &message, &self.stats)
                    .await;
            }
            Event::Incoming(Packet::PubAck(ack)) => {
                debug!(category = "mqtt", "PubAck: {}", ack.pkid);
            }
            Event::Outgoing(Outgoing::Publish(pkid)) => {
                debug!(category = "mqtt", "mid: {}", pkid);
            }
            other => {
                debug!(category = "mqtt", "{:?}", other);
            }
        }
    }

    /// Queue one SUBSCRIBE carrying every filter, so the request queue
    /// needs a single free slot however many filters are configured.
    fn subscribe_all(&self) -> Result<()> {
        for filter in &self.filters {
            debug!(category = "mqtt", "Subscribing to {}", filter);
        }
        self.client.try_subscribe_many(self.subscribe_filters())?;
        Ok(())
    }

    fn subscribe_filters(&self) -> Vec<SubscribeFilter> {
        self.filters
            .iter()
            .map(|filter| SubscribeFilter::new(filter.as_str().to_string(), self.subscription_qos))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homie_hooks_core::{MappingTables, Translator};
    use rumqttc::{SubAck, SubscribeReasonCode};
    use tracing_test::traced_test;

    #[test]
    fn test_mqtt_options_from_config() {
        let config = BridgeConfig {
            server_address: "192.168.0.26".to_string(),
            server_port: 1884,
            client_id: Some("bridge-1".to_string()),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            keep_alive_secs: 30,
            ..BridgeConfig::default()
        };
        let options = mqtt_options(&config).unwrap();
        assert_eq!(options.client_id(), "bridge-1");
        assert_eq!(options.broker_address(), ("192.168.0.26".to_string(), 1884));
        assert_eq!(options.keep_alive(), Duration::from_secs(30));
        assert_eq!(
            options.credentials(),
            Some(("user".to_string(), "pass".to_string()))
        );
    }

    #[test]
    fn test_generated_client_id() {
        let options = mqtt_options(&BridgeConfig::default()).unwrap();
        assert!(options.client_id().starts_with("homie-hooks-"));
        assert_eq!(options.credentials(), None);
    }

    #[test]
    fn test_invalid_client_id() {
        let config = BridgeConfig {
            client_id: Some(String::new()),
            ..BridgeConfig::default()
        };
        assert!(matches!(
            mqtt_options(&config),
            Err(BridgeError::InvalidClientId(_))
        ));
    }

    #[test]
    fn test_bridge_rejects_bad_subscriptions() {
        let config = BridgeConfig {
            subscriptions: vec!["homie/#/x".to_string()],
            ..BridgeConfig::default()
        };
        let translator = Translator::new(Arc::new(MappingTables::default()));
        assert!(matches!(
            MqttBridge::new(&config, translator),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_bridge_new_does_not_connect() {
        let translator = Translator::new(Arc::new(MappingTables::default()));
        let bridge = MqttBridge::new(&BridgeConfig::default(), translator).unwrap();
        assert_eq!(bridge.filters().len(), 3);
        assert_eq!(bridge.stats().snapshot().received, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        // Nothing listens on this port; the loop must still honour shutdown
        let config = BridgeConfig {
            server_address: "127.0.0.1".to_string(),
            server_port: 1,
            reconnect_delay_ms: 10,
            ..BridgeConfig::default()
        };
        let translator = Translator::new(Arc::new(MappingTables::default()));
        let bridge = MqttBridge::new(&config, translator).unwrap();
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        let result = tokio::time::timeout(Duration::from_secs(5), bridge.run(shutdown)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[test]
    fn test_subscriptions_fit_a_single_request_slot() {
        let config = BridgeConfig {
            request_capacity: 1,
            subscription_qos: homie_hooks_core::Qos::AtLeastOnce,
            ..BridgeConfig::default()
        };
        let translator = Translator::new(Arc::new(MappingTables::default()));
        let bridge = MqttBridge::new(&config, translator).unwrap();
        assert_eq!(bridge.filters().len(), 3);

        let filters = bridge.subscribe_filters();
        let paths: Vec<&str> = filters.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, homie_hooks_core::DEFAULT_SUBSCRIPTIONS);
        assert!(filters.iter().all(|f| f.qos == rumqttc::QoS::AtLeastOnce));

        // All three filters go out in the one available slot
        assert!(bridge.subscribe_all().is_ok());
        // The slot is now taken, so a second request is refused
        assert!(matches!(bridge.subscribe_all(), Err(BridgeError::Client(_))));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_suback_is_logged_at_debug() {
        let translator = Translator::new(Arc::new(MappingTables::default()));
        let bridge = MqttBridge::new(&BridgeConfig::default(), translator).unwrap();
        let ack = SubAck {
            pkid: 7,
            return_codes: vec![SubscribeReasonCode::Success(rumqttc::QoS::AtMostOnce)],
        };
        bridge.handle_event(Event::Incoming(Packet::SubAck(ack))).await;

        logs_assert(|lines: &[&str]| {
            let line = lines
                .iter()
                .find(|line| line.contains("Subscribed: 7"))
                .ok_or_else(|| "no SubAck line".to_string())?;
            if line.contains("DEBUG") {
                Ok(())
            } else {
                Err(format!("SubAck not logged at debug: {}", line))
            }
        });
    }
}
