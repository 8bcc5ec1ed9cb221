//! Bridge driver errors.

use homie_hooks_core::ConfigError;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Request could not be queued on the MQTT client.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid client id: {0:?}")]
    InvalidClientId(String),
}
