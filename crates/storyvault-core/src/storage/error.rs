//! Storage error handling
//!
//! Provides typed errors for record store operations with descriptive
//! messages and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during record store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to open the database
    #[error("Failed to open library database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A read failed in the underlying database
    #[error("Failed to {operation}: {source}")]
    Read {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A write failed in the underlying database
    #[error("Failed to {operation}: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Disk is full or quota exceeded
    #[error("Disk full or quota exceeded while trying to {operation}. Free up disk space and try again.")]
    QuotaExceeded {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A stored document could not be parsed
    #[error("Stored story '{id}' is corrupted: {source}")]
    CorruptRecord {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized for storage
    #[error("Failed to serialize story '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Connection lock poisoned by a panicking operation
    #[error("Library database connection is unusable after an earlier failure")]
    Poisoned,

    /// Blocking task failed to complete
    #[error("Database task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Classify a failed read
    pub fn read(operation: &'static str, source: rusqlite::Error) -> Self {
        StorageError::Read { operation, source }
    }

    /// Classify a failed write, detecting full disks
    pub fn write(operation: &'static str, source: rusqlite::Error) -> Self {
        if is_disk_full_error(&source) {
            StorageError::QuotaExceeded { operation, source }
        } else {
            StorageError::Write { operation, source }
        }
    }

    /// Whether this is a read failure
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            StorageError::Read { .. } | StorageError::CorruptRecord { .. }
        )
    }

    /// Whether this is a write failure
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StorageError::Write { .. }
                | StorageError::QuotaExceeded { .. }
                | StorageError::Serialize { .. }
        )
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::QuotaExceeded { .. }
                | StorageError::CreateDirectory { .. }
                | StorageError::CorruptRecord { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::QuotaExceeded { .. } => Some("Free up disk space and try again."),
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::CorruptRecord { .. } => {
                Some("Delete the affected story or restore the library from a backup archive.")
            }
            StorageError::Open { .. } => {
                Some("Check the data_dir setting and that no other program holds the database.")
            }
            _ => None,
        }
    }
}

/// Check if a SQLite error indicates a disk full condition
fn is_disk_full_error(error: &rusqlite::Error) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(e, _) => e.code == rusqlite::ErrorCode::DiskFull,
        _ => false,
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
