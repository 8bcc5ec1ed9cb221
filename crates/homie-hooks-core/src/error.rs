//! Error types for topic parsing, filter validation and configuration.

use std::path::PathBuf;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Why an inbound topic could not be parsed into device identity and command key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicParseError {
    /// Topic starts with neither bus prefix.
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// Topic has the right prefix but the wrong number of levels.
    #[error("Expected {expected} topic levels, found {found}")]
    SegmentCount { expected: usize, found: usize },

    /// A level that carries an identity or command is empty.
    #[error("Empty topic level at index {0}")]
    EmptySegment(usize),
}

/// Invalid MQTT topic filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Topic filter is empty")]
    Empty,

    /// `+` or `#` shares a level with other characters.
    #[error("Wildcard must occupy a whole level at index {0}")]
    PartialWildcard(usize),

    /// `#` appears before the last level.
    #[error("Multi-level wildcard must be the last level")]
    MisplacedMultiLevel,
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A device id is already paired with a different counterpart.
    #[error("Device {id} is mapped to both {existing} and {conflicting}")]
    ConflictingDevice {
        id: String,
        existing: String,
        conflicting: String,
    },

    #[error("Invalid device id: {0:?}")]
    InvalidDeviceId(String),

    #[error("Invalid command mapping {key:?} -> {value:?}")]
    InvalidCommand { key: String, value: String },

    #[error("Invalid subscription {filter:?}: {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: FilterError,
    },

    #[error("No subscriptions configured")]
    NoSubscriptions,
}
