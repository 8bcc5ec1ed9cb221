//! Messages exchanged with the transport and the handler contract.

use serde::Deserialize;

/// MQTT QoS level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[repr(u8)]
#[serde(try_from = "u8")]
pub enum Qos {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for Qos {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            other => Err(format!("Invalid QoS level: {}", other)),
        }
    }
}

impl From<Qos> for u8 {
    fn from(qos: Qos) -> Self {
        qos as u8
    }
}

/// A message as delivered by, or handed to, the transport.
///
/// The payload is opaque; nothing in this crate inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: Qos,
    pub retain: bool,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>, qos: Qos) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retain: false,
        }
    }

    /// Same payload and QoS on another topic.
    pub fn forward_to(&self, topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: self.payload.clone(),
            qos: self.qos,
            retain: false,
        }
    }

    /// Payload as text for diagnostics.
    pub fn payload_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Decides what, if anything, to republish for one inbound message.
///
/// Handlers run synchronously inside the transport loop and must not block.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, message: &Message) -> Option<Message>;
}
