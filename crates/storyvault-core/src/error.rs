//! Library-level errors
//!
//! Aggregates the storage, codec and validation errors returned by the
//! operations of [`crate::Library`] and the import/export engine.

use thiserror::Error;

use crate::archive::{DecodeError, EncodeError};
use crate::models::ValidationError;
use crate::storage::StorageError;

/// Errors returned by library operations
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to read archive: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to create archive: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding failed partway through an import. Stories written before the
    /// failure stay in the library.
    #[error("Import aborted after adding {added} and skipping {skipped} stories: {source}")]
    ImportAborted {
        added: usize,
        skipped: usize,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Story not found: {0}")]
    NotFound(String),

    #[error("No story selected")]
    NothingSelected,

    #[error("Failed to send story content: {0}")]
    Send(String),
}

impl LibraryError {
    /// Whether the underlying failure was a store read
    pub fn is_store_read(&self) -> bool {
        matches!(self, LibraryError::Storage(e) if e.is_read())
    }

    /// Whether the underlying failure was a store write
    pub fn is_store_write(&self) -> bool {
        matches!(self, LibraryError::Storage(e) if e.is_write())
    }
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;
