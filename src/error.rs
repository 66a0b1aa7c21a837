use thiserror::Error;

/// Main error type for the simulator
#[derive(Error, Debug)]
pub enum SimError {
    // Environment contract errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid action: {0} (expected 0 = hold, 1 = buy protection, 2 = sell protection)")]
    InvalidAction(usize),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    // Configuration loading errors
    #[error("Config loading error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Worker errors
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SimError
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Whether the caller can recover by retrying with different input
    /// on the same environment instance.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SimError::InvalidAction(_) | SimError::IllegalState(_))
    }
}
