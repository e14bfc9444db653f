//! Error types for storage operations

use std::fmt;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while persisting an alert
#[derive(Debug)]
pub enum StorageError {
    /// Failed to open or connect to the storage medium
    ConnectionFailed(String),

    /// Database statement failed
    QueryFailed(String),

    /// Cloud upload failed
    UploadFailed(String),

    /// I/O error (file access, etc.)
    IoError(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed(msg) => {
                write!(f, "failed to connect to storage backend: {}", msg)
            }
            StorageError::QueryFailed(msg) => write!(f, "storage query failed: {}", msg),
            StorageError::UploadFailed(msg) => write!(f, "storage upload failed: {}", msg),
            StorageError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io_err) => StorageError::IoError(io_err),
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Errors raised while selecting a storage backend
///
/// Fatal at startup; at runtime reconfiguration the previously selected
/// backend stays in effect.
#[derive(Debug)]
pub enum ConfigError {
    /// The backend identifier is not one of `file`, `db` or `cloud`
    UnsupportedBackend(String),

    /// The configuration is missing a value the selected backend needs
    MissingValue(&'static str),

    /// The backend was recognized but failed to initialize
    Storage(StorageError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedBackend(backend) => {
                write!(f, "unsupported storage backend: {}", backend)
            }
            ConfigError::MissingValue(field) => {
                write!(f, "missing configuration value: {}", field)
            }
            ConfigError::Storage(err) => {
                write!(f, "storage backend failed to initialize: {}", err)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(err: StorageError) -> Self {
        ConfigError::Storage(err)
    }
}
