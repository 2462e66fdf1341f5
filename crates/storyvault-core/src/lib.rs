//! StoryVault Core Library
//!
//! This crate provides the core functionality for StoryVault, a local
//! library of short text stories that can be tagged, searched, backed up
//! and sent to a chat input.
//!
//! # Architecture
//!
//! - **SQLite**: durable record store, one JSON document per story
//! - **Zip archives**: portable backups with a manifest and one file per story
//!
//! Listing and search are served from an in-memory index that is rebuilt
//! from the store after every mutation.
//!
//! # Quick Start
//!
//! ```text
//! let mut library = Library::open(Config::load()?).await?;
//!
//! // Add a story
//! library.create_story(StoryDraft::new("Title", "Once upon a time")).await?;
//!
//! // Query stories
//! let tagged = library.filter(&StoryFilter::tag("fantasy"));
//! ```
//!
//! # Modules
//!
//! - `library`: Session object (main entry point)
//! - `command`: Command objects executed by the library
//! - `models`: Story records and drafts
//! - `storage`: SQLite record store
//! - `archive`: Backup archive codec
//! - `backup`: Import/merge and export engine
//! - `index`: In-memory index, tag facets and search
//! - `host`: Front-end callbacks
//! - `config`: Application configuration

pub mod archive;
pub mod backup;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod index;
pub mod library;
pub mod models;
pub mod storage;

pub use archive::{ArchiveReader, DecodeError, EncodeError};
pub use backup::{ArchiveExport, ExportOutcome, ImportMode, ImportOptions, ImportSummary};
pub use command::{CommandOutcome, LibraryCommand};
pub use config::Config;
pub use error::{LibraryError, LibraryResult};
pub use host::{AutoConfirm, LibraryHost};
pub use index::{LibraryIndex, StoryFilter, ALL_TAG};
pub use library::Library;
pub use models::{ManifestEntry, StoryDraft, StoryRecord, ValidationError};
pub use storage::{RecordStore, SqliteRecordStore, StorageError};
