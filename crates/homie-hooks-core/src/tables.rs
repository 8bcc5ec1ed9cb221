//! Device identity and command lookup tables.
//!
//! Both lookups are total: a miss yields a sentinel instead of an error.
//! Tables are built once from configuration and never mutated, so they can
//! be shared behind an `Arc` without locking.

use std::collections::HashMap;

use tracing::{info, trace};

use crate::error::{ConfigError, Result};

/// Returned by [`DeviceMap::resolve`] for an identity with no counterpart.
pub const UNKNOWN_DEVICE: &str = "0";

/// Returned by [`CommandMap::resolve`] when a command key has no mapping.
pub const NO_COMMAND: &str = "";

/// Device pairs of the reference deployment: (device-bus id, hub id).
pub const DEFAULT_DEVICES: &[(&str, &str)] = &[("5ccf7fd3945b", "17")];

/// Command mappings of the reference deployment.
pub const DEFAULT_COMMANDS: &[(&str, &str)] = &[
    ("temperature/degrees", "dht/temp"),
    ("humidity/relative", "dht/humi"),
    ("LED/on", "switch/on/set"),
];

fn is_valid_level(value: &str) -> bool {
    !value.is_empty() && !value.contains(['/', '+', '#'])
}

/// Symmetric device identity map.
///
/// Every pair is stored in both directions, so `resolve(resolve(a)) == a`
/// holds for every known identity.
#[derive(Debug, Clone, Default)]
pub struct DeviceMap {
    counterparts: HashMap<String, String>,
}

impl DeviceMap {
    /// Build from (device-bus id, hub id) pairs.
    pub fn from_pairs<I, A, B>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut map = Self::default();
        for (device_id, hub_id) in pairs {
            map.insert(device_id.into(), hub_id.into())?;
        }
        Ok(map)
    }

    fn insert(&mut self, a: String, b: String) -> Result<()> {
        for id in [&a, &b] {
            if !is_valid_level(id) {
                return Err(ConfigError::InvalidDeviceId(id.clone()));
            }
        }
        self.bind(&a, &b)?;
        self.bind(&b, &a)
    }

    fn bind(&mut self, from: &str, to: &str) -> Result<()> {
        match self.counterparts.get(from) {
            Some(existing) if existing != to => Err(ConfigError::ConflictingDevice {
                id: from.to_string(),
                existing: existing.clone(),
                conflicting: to.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.counterparts.insert(from.to_string(), to.to_string());
                Ok(())
            }
        }
    }

    /// Counterpart identity, or [`UNKNOWN_DEVICE`].
    pub fn resolve(&self, id: &str) -> &str {
        self.counterparts
            .get(id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DEVICE)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.counterparts.contains_key(id)
    }

    /// Number of directed entries (two per configured pair).
    pub fn len(&self) -> usize {
        self.counterparts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counterparts.is_empty()
    }
}

/// One-way command map, consulted with the same key space in both directions.
#[derive(Debug, Clone, Default)]
pub struct CommandMap {
    commands: HashMap<String, String>,
}

impl CommandMap {
    /// Build from (key, command) entries. Keys are `<a>/<b>`; commands are
    /// one or more non-empty levels without wildcards.
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut commands = HashMap::new();
        for (key, value) in entries {
            let (key, value) = (key.into(), value.into());
            let key_ok = key.split('/').count() == 2 && key.split('/').all(is_valid_level);
            let value_ok = !value.is_empty() && value.split('/').all(is_valid_level);
            if !key_ok || !value_ok {
                return Err(ConfigError::InvalidCommand { key, value });
            }
            commands.insert(key, value);
        }
        Ok(Self { commands })
    }

    /// Mapped command, or [`NO_COMMAND`].
    pub fn resolve(&self, key: &str) -> &str {
        self.commands
            .get(key)
            .map(String::as_str)
            .unwrap_or(NO_COMMAND)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Both lookup tables plus the diagnostics flag.
#[derive(Debug, Clone)]
pub struct MappingTables {
    devices: DeviceMap,
    commands: CommandMap,
    verbose: bool,
}

impl MappingTables {
    pub fn new(devices: DeviceMap, commands: CommandMap) -> Self {
        Self {
            devices,
            commands,
            verbose: false,
        }
    }

    /// Log lookup misses.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn commands(&self) -> &CommandMap {
        &self.commands
    }

    pub fn resolve_device_identity(&self, id: &str) -> &str {
        let resolved = self.devices.resolve(id);
        trace!(category = "mapping", id, resolved, "Device lookup");
        if self.verbose && !self.devices.contains(id) {
            info!(category = "mapping", "Unknown device ID: {}", id);
        }
        resolved
    }

    pub fn resolve_command(&self, key: &str) -> &str {
        let resolved = self.commands.resolve(key);
        trace!(category = "mapping", key, resolved, "Command lookup");
        if self.verbose && resolved == NO_COMMAND {
            info!(category = "mapping", "Tried to map unknown command: {}", key);
        }
        resolved
    }
}

impl Default for MappingTables {
    fn default() -> Self {
        // The built-in pairs are constants known to be valid
        let devices = DeviceMap {
            counterparts: DEFAULT_DEVICES
                .iter()
                .flat_map(|(a, b)| [(a.to_string(), b.to_string()), (b.to_string(), a.to_string())])
                .collect(),
        };
        let commands = CommandMap {
            commands: DEFAULT_COMMANDS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        Self::new(devices, commands)
    }
}
