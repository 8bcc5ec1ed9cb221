//! Bidirectional topic translation between the device bus and the hub bus.
//!
//! ```text
//! homie/5ccf7fd3945b/temperature/degrees  ──▶  /hooks/devices/17/dht/temp
//! /hooks/devices/17/LED/on                ──▶  homie/5ccf7fd3945b/switch/on/set
//! ```
//!
//! Only the topic is rewritten; payload and QoS pass through untouched.

use std::sync::Arc;

use tracing::info;

use crate::error::TopicParseError;
use crate::message::{Message, MessageHandler};
use crate::tables::{MappingTables, NO_COMMAND};
use crate::topic::{self, parse_topic};

/// Why a topic was not translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnhandledReason {
    /// Unknown namespace or wrong level layout.
    Malformed(TopicParseError),
    /// The command key has no mapping.
    UnknownCommand(String),
}

impl std::fmt::Display for UnhandledReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "{}", err),
            Self::UnknownCommand(key) => write!(f, "No command mapping for {}", key),
        }
    }
}

/// Outcome of translating one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Translated(String),
    Unhandled(UnhandledReason),
}

impl Translation {
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Translated(topic) => Some(topic),
            Self::Unhandled(_) => None,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Self::Translated(_))
    }
}

/// Pure topic translator over shared, immutable tables.
#[derive(Debug, Clone)]
pub struct Translator {
    tables: Arc<MappingTables>,
}

impl Translator {
    pub fn new(tables: Arc<MappingTables>) -> Self {
        Self { tables }
    }

    /// Translate an inbound topic into the other bus's addressing scheme.
    pub fn translate(&self, topic: &str) -> Translation {
        if self.tables.verbose() {
            for level in topic::levels(topic) {
                info!(category = "translate", "    > {}", level);
            }
        }

        let parsed = match parse_topic(topic) {
            Ok(parsed) => parsed,
            Err(err) => return Translation::Unhandled(UnhandledReason::Malformed(err)),
        };

        let command = self.tables.resolve_command(parsed.command_key);
        if command == NO_COMMAND {
            return Translation::Unhandled(UnhandledReason::UnknownCommand(
                parsed.command_key.to_string(),
            ));
        }
        let device_id = self.tables.resolve_device_identity(parsed.device_id);

        Translation::Translated(format!(
            "{}{}/{}",
            parsed.direction.target_prefix(),
            device_id,
            command
        ))
    }
}

impl MessageHandler for Translator {
    fn handle(&self, message: &Message) -> Option<Message> {
        let verbose = self.tables.verbose();
        if verbose {
            info!(category = "translate", "Translating message");
            info!(category = "translate", "  > TOPIC  : {}", message.topic);
            info!(category = "translate", "  > QOS    : {}", u8::from(message.qos));
            info!(category = "translate", "  > PAYLOAD: {}", message.payload_lossy());
        }

        match self.translate(&message.topic) {
            Translation::Translated(topic) => {
                if verbose {
                    info!(category = "translate", "Translated topic: {}", topic);
                }
                Some(message.forward_to(topic))
            }
            Translation::Unhandled(reason) => {
                if verbose {
                    info!(
                        category = "translate",
                        "Not able to translate this topic: {} ({})", message.topic, reason
                    );
                }
                None
            }
        }
    }
}
