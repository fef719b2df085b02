//! Error types for musing-core

use thiserror::Error;

/// Result type alias for musing operations
pub type Result<T> = std::result::Result<T, MusingError>;

/// Main error type for musing operations
#[derive(Error, Debug)]
pub enum MusingError {
    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Callback payload errors
    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    /// Transport delivery errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse classification used to pick the user-facing reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    StorageUnavailable,
    Transport,
    Config,
}

impl MusingError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MusingError::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            MusingError::Store(StoreError::Validation(_) | StoreError::TagTooLong { .. }) => {
                ErrorKind::Validation
            }
            MusingError::Store(StoreError::Unavailable(_)) => ErrorKind::StorageUnavailable,
            MusingError::Store(StoreError::SchemaVersionMismatch { .. }) => {
                ErrorKind::StorageUnavailable
            }
            MusingError::Callback(_) => ErrorKind::Validation,
            MusingError::Transport(_) => ErrorKind::Transport,
            MusingError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Record store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Referenced thought or tag does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before reaching the database
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Tag name too long to fit in a button payload
    #[error("Tag name exceeds {max_bytes} bytes")]
    TagTooLong { max_bytes: usize },

    /// Persistence layer cannot be reached or failed mid-operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },
}

/// Callback payload errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// Payload prefix is not a known action
    #[error("Unknown callback action: {0}")]
    UnknownAction(String),

    /// Payload has the wrong number of fields
    #[error("Malformed callback payload: {0}")]
    Malformed(String),

    /// A numeric field failed to parse
    #[error("Invalid number in callback payload {payload}: {field}")]
    InvalidNumber { payload: String, field: String },
}

/// Transport delivery errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request could not be sent
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Remote API rejected the call
    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("IO error: {0}")]
    Io(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(String),

    /// No bot token in the environment or config file
    #[error("Missing bot token (set MUSING_TOKEN or TOKEN, or telegram.token in the config file)")]
    MissingToken,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(err.to_string()),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for MusingError {
    fn from(err: rusqlite::Error) -> Self {
        MusingError::Store(StoreError::from(err))
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err: MusingError = StoreError::NotFound("thought 3".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: MusingError = StoreError::Unavailable("disk I/O error".into()).into();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);

        let err: MusingError = CallbackError::UnknownAction("zap".into()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
