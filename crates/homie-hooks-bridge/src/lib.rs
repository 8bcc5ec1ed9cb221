//! MQTT driver for the Homie / hub topic bridge.
//!
//! The driver owns the broker connection and subscriptions. Translation is
//! delegated to any [`MessageHandler`](homie_hooks_core::MessageHandler),
//! normally a [`Translator`](homie_hooks_core::Translator), and outbound
//! messages go through a [`Publisher`].

pub mod dispatch;
pub mod error;
pub mod mqtt;
pub mod publisher;
pub mod stats;

pub use dispatch::{dispatch, dispatch_counted, Dispatch};
pub use error::{BridgeError, Result};
pub use mqtt::{mqtt_options, MqttBridge};
pub use publisher::{qos_from_mqtt, qos_to_mqtt, Publisher};
pub use stats::{BridgeStats, StatsSnapshot};
