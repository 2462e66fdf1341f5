//! Storage layer
//!
//! Handles durable persistence of story records.
//!
//! ## Architecture
//!
//! - **RecordStore**: async contract for a single table keyed by story id
//! - **SqliteRecordStore**: embedded implementation, opened lazily
//!
//! Every record is stored as one JSON document, so the store never needs to
//! know which fields a story carries beyond its id.

pub mod error;
pub mod record_store;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use record_store::{RecordStore, SqliteRecordStore};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
