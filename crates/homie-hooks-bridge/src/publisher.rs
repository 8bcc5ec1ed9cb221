//! Outbound side of the bridge.

use async_trait::async_trait;
use homie_hooks_core::{Message, Qos};

use crate::error::Result;

/// Sends a translated message to the broker.
///
/// Publishing is fire-and-forget: success means the request was queued,
/// not that the broker acknowledged it.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, message: Message) -> Result<()>;
}

#[async_trait]
impl Publisher for rumqttc::AsyncClient {
    async fn publish(&self, message: Message) -> Result<()> {
        // The bridge publishes from inside the event loop task, so an
        // awaiting send on a full queue would never be drained.
        self.try_publish(
            message.topic,
            qos_to_mqtt(message.qos),
            message.retain,
            message.payload,
        )?;
        Ok(())
    }
}

pub fn qos_to_mqtt(qos: Qos) -> rumqttc::QoS {
    match qos {
        Qos::AtMostOnce => rumqttc::QoS::AtMostOnce,
        Qos::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        Qos::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

pub fn qos_from_mqtt(qos: rumqttc::QoS) -> Qos {
    match qos {
        rumqttc::QoS::AtMostOnce => Qos::AtMostOnce,
        rumqttc::QoS::AtLeastOnce => Qos::AtLeastOnce,
        rumqttc::QoS::ExactlyOnce => Qos::ExactlyOnce,
    }
}
