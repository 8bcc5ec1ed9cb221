//! Bridge configuration loaded from `config.toml`.
//!
//! ```toml
//! verbose_logging = false
//! server_address = "192.168.0.26"
//! server_port = 1883
//!
//! subscriptions = ["homie/+/temperature/degrees", "/hooks/devices/+/LED/on"]
//!
//! [devices]            # device-bus id = hub id
//! 5ccf7fd3945b = "17"
//!
//! [commands]
//! "temperature/degrees" = "dht/temp"
//! "LED/on" = "switch/on/set"
//! ```
//!
//! Every key is optional; missing keys fall back to the reference deployment.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::filter::{TopicFilter, DEFAULT_SUBSCRIPTIONS};
use crate::message::Qos;
use crate::tables::{CommandMap, DeviceMap, MappingTables, DEFAULT_COMMANDS, DEFAULT_DEVICES};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Startup configuration of the bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Per-message diagnostic dumps.
    pub verbose_logging: bool,

    /// Broker host.
    pub server_address: String,

    /// Broker port.
    pub server_port: u16,

    /// Client ID; a random one is generated when absent.
    pub client_id: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,

    /// Pause between event loop polls after a connection error.
    pub reconnect_delay_ms: u64,

    /// Capacity of the outgoing request queue.
    pub request_capacity: usize,

    /// Clear the terminal when the bridge starts.
    pub clear_screen: bool,

    /// Topic filters to subscribe to.
    pub subscriptions: Vec<String>,

    /// QoS requested for every subscription.
    pub subscription_qos: Qos,

    /// Device-bus id -> hub id. Stored in both directions at startup.
    pub devices: BTreeMap<String, String>,

    /// Command key -> command.
    pub commands: BTreeMap<String, String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            server_address: "localhost".to_string(),
            server_port: 1883,
            client_id: None,
            username: None,
            password: None,
            keep_alive_secs: 60,
            reconnect_delay_ms: 1000,
            request_capacity: 64,
            clear_screen: true,
            subscriptions: DEFAULT_SUBSCRIPTIONS.iter().map(|s| s.to_string()).collect(),
            subscription_qos: Qos::AtMostOnce,
            devices: DEFAULT_DEVICES
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            commands: DEFAULT_COMMANDS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(category = "config", "Loading config from: {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    category = "config",
                    "{} not found, using built-in configuration",
                    path.display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Host and port, e.g. `localhost:1883`.
    pub fn broker_addr(&self) -> String {
        format!("{}:{}", self.server_address, self.server_port)
    }

    /// Validated subscription filters.
    pub fn filters(&self) -> Result<Vec<TopicFilter>> {
        if self.subscriptions.is_empty() {
            return Err(ConfigError::NoSubscriptions);
        }
        self.subscriptions
            .iter()
            .map(|filter| {
                TopicFilter::parse(filter.as_str()).map_err(|source| ConfigError::InvalidFilter {
                    filter: filter.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Build the lookup tables, carrying the verbosity flag.
    pub fn build_tables(&self) -> Result<MappingTables> {
        let devices = DeviceMap::from_pairs(self.devices.iter().map(|(a, b)| (a.as_str(), b.as_str())))?;
        let commands = CommandMap::new(self.commands.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        Ok(MappingTables::new(devices, commands).with_verbose(self.verbose_logging))
    }

    /// Check everything that can be checked without a broker.
    pub fn validate(&self) -> Result<()> {
        self.filters()?;
        self.build_tables()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert!(!config.verbose_logging);
        assert_eq!(config.broker_addr(), "localhost:1883");
        assert_eq!(config.subscriptions.len(), 3);
        assert_eq!(config.devices.get("5ccf7fd3945b").map(String::as_str), Some("17"));
        assert_eq!(config.commands.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
verbose_logging = true
server_address = "192.168.0.26"
server_port = 1884
subscription_qos = 1
subscriptions = ["homie/+/temperature/degrees"]

[devices]
5ccf7fd3945b = "17"
a1b2c3d4e5f6 = "18"

[commands]
"temperature/degrees" = "dht/temp"
"#;
        let config = BridgeConfig::from_toml_str(toml_content).unwrap();
        assert!(config.verbose_logging);
        assert_eq!(config.broker_addr(), "192.168.0.26:1884");
        assert_eq!(config.subscription_qos, Qos::AtLeastOnce);
        assert_eq!(config.filters().unwrap().len(), 1);

        let tables = config.build_tables().unwrap();
        assert!(tables.verbose());
        assert_eq!(tables.resolve_device_identity("18"), "a1b2c3d4e5f6");
        assert_eq!(tables.resolve_command("LED/on"), "");
    }

    #[test]
    fn test_example_config_is_valid() {
        let config =
            BridgeConfig::from_toml_str(include_str!("../../../config.example.toml")).unwrap();
        assert_eq!(config.broker_addr(), "192.168.0.26:1883");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_qos_is_rejected() {
        assert!(matches!(
            BridgeConfig::from_toml_str("subscription_qos = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_subscription_is_rejected() {
        let config = BridgeConfig::from_toml_str(r#"subscriptions = ["homie/#/degrees"]"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFilter { .. })));

        let config = BridgeConfig::from_toml_str("subscriptions = []").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoSubscriptions)));
    }

    #[test]
    fn test_conflicting_devices_are_rejected() {
        let config = BridgeConfig::from_toml_str(
            r#"
[devices]
5ccf7fd3945b = "17"
a1b2c3d4e5f6 = "17"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.build_tables(),
            Err(ConfigError::ConflictingDevice { .. })
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = BridgeConfig::load_or_default("/nonexistent/homie-hooks/config.toml").unwrap();
        assert_eq!(config.server_port, 1883);
        assert!(matches!(
            BridgeConfig::load("/nonexistent/homie-hooks/config.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
