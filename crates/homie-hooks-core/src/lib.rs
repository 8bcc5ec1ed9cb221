//! Topic translation between a Homie device bus and a hub webhook bus.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **MappingTables**: symmetric device identity map and command map
//! - **Translator**: rewrites an inbound topic into the other bus's scheme
//! - **TopicFilter**: validated subscription filters
//! - **BridgeConfig**: startup configuration from `config.toml`
//!
//! ```text
//! inbound Message ──▶ Translator ──▶ Translation::Translated(topic) ──▶ republish
//!                        │                     │
//!                  MappingTables      Translation::Unhandled ──▶ drop
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod message;
pub mod tables;
pub mod topic;
pub mod translator;

pub use config::{BridgeConfig, DEFAULT_CONFIG_PATH};
pub use error::{ConfigError, FilterError, Result, TopicParseError};
pub use filter::{default_filters, TopicFilter, DEFAULT_SUBSCRIPTIONS};
pub use message::{Message, MessageHandler, Qos};
pub use tables::{CommandMap, DeviceMap, MappingTables, NO_COMMAND, UNKNOWN_DEVICE};
pub use topic::{parse_topic, Direction, Namespace, ParsedTopic, DEVICE_BUS_PREFIX, HUB_BUS_PREFIX};
pub use translator::{Translation, Translator, UnhandledReason};
