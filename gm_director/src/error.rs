//! Errors at the director's edges. None of them reach the decision surface;
//! the director logs and swallows them.

use thiserror::Error;

/// Failure talking to the durable record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize GM state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("persistent storage is disabled")]
    Disabled,
}

/// Failure loading a director configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
