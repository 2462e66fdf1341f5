//! Archive codec
//!
//! Backups are zip archives with a fixed layout:
//!
//! ```text
//! data/index.json            manifest: [{id, title, author, tags}]
//! data/stories/<id>.json     one pretty-printed story document per record
//! ```
//!
//! The manifest is informational. Importing reads only the story documents,
//! one entry at a time, so large archives are never fully materialized.

use std::io::{self, Cursor, Read, Seek, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::models::{ManifestEntry, StoryRecord};

/// Top-level folder of every archive
pub const DATA_DIR: &str = "data/";

/// Folder holding one document per story
pub const STORIES_DIR: &str = "data/stories/";

/// Manifest path inside the archive
pub const MANIFEST_PATH: &str = "data/index.json";

/// Reasons an archive cannot be read
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("File is not a valid zip archive: {0}")]
    NotAnArchive(#[source] ZipError),

    #[error("Archive has no \"data\" folder")]
    MissingDataFolder,

    #[error("Archive has no \"data/stories\" folder")]
    MissingStoriesFolder,

    #[error("The \"data/stories\" folder of the archive contains no story files")]
    NoStories,

    #[error("Failed to read '{path}' from archive: {source}")]
    UnreadableEntry {
        path: String,
        #[source]
        source: ZipError,
    },

    #[error("Story file '{path}' is malformed: {source}")]
    MalformedRecord {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Archive manifest is malformed: {0}")]
    MalformedManifest(#[source] serde_json::Error),

    #[error("Story file '{path}' has an id that is not a plain file name: '{id}'")]
    UnsafeId { path: String, id: String },
}

/// Reasons an archive cannot be written
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Failed to serialize '{path}': {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write archive: {0}")]
    Zip(#[from] ZipError),

    #[error("Failed to write archive: {0}")]
    Io(#[from] io::Error),

    #[error("Story id '{0}' cannot be used as an archive file name")]
    UnsafeId(String),
}

/// Encode records into archive bytes
pub fn encode(records: &[StoryRecord]) -> Result<Vec<u8>, EncodeError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    writer.add_directory(DATA_DIR, file_options())?;
    writer.add_directory(STORIES_DIR, file_options())?;

    let manifest: Vec<ManifestEntry> = records.iter().map(StoryRecord::manifest_entry).collect();
    write_json(&mut writer, MANIFEST_PATH, &manifest)?;

    for record in records {
        if !is_safe_id(&record.id) {
            return Err(EncodeError::UnsafeId(record.id.clone()));
        }
        write_json(&mut writer, &story_path(&record.id), record)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Decode every record of an archive
///
/// Fails on the first malformed document; there is no partial result.
pub fn decode(bytes: &[u8]) -> Result<Vec<StoryRecord>, DecodeError> {
    let mut reader = ArchiveReader::new(Cursor::new(bytes))?;
    let records = reader.records().collect::<Result<Vec<_>, _>>();
    records
}

/// Path of a story document inside the archive
///
/// The id becomes part of the entry name, so only ids accepted by
/// [`is_safe_id`] are written or read.
pub fn story_path(id: &str) -> String {
    format!("{}{}.json", STORIES_DIR, id)
}

/// Whether an id can name a file directly inside `data/stories/`
///
/// Rejects empty ids, `.` and `..`, and anything with a path separator, so an
/// extracted backup never writes outside its stories folder.
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

/// File name for an exported backup, e.g. `StoryVault-Backup-20240131093000.zip`
pub fn backup_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-Backup-{}.zip", prefix, at.format("%Y%m%d%H%M%S"))
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn write_json<W, T>(writer: &mut ZipWriter<W>, path: &str, value: &T) -> Result<(), EncodeError>
where
    W: Write + Seek,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value).map_err(|source| EncodeError::Serialize {
        path: path.to_string(),
        source,
    })?;
    writer.start_file(path, file_options())?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

/// Validated, lazily decoded archive
///
/// Construction checks the folder layout; story documents are only read
/// when iterating [`ArchiveReader::records`].
pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    story_entries: Vec<usize>,
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Open an archive and check its layout
    pub fn new(reader: R) -> Result<Self, DecodeError> {
        let mut archive = ZipArchive::new(reader).map_err(DecodeError::NotAnArchive)?;

        let mut has_data = false;
        let mut has_stories = false;
        let mut story_entries = Vec::new();

        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|source| DecodeError::UnreadableEntry {
                    path: format!("entry #{}", index),
                    source,
                })?;
            let name = entry.name();

            if name.starts_with(DATA_DIR) {
                has_data = true;
            }
            if name.starts_with(STORIES_DIR) {
                has_stories = true;
                if !entry.is_dir() && name.ends_with(".json") {
                    story_entries.push(index);
                }
            }
        }

        if !has_data {
            return Err(DecodeError::MissingDataFolder);
        }
        if !has_stories {
            return Err(DecodeError::MissingStoriesFolder);
        }
        if story_entries.is_empty() {
            return Err(DecodeError::NoStories);
        }

        Ok(Self {
            archive,
            story_entries,
        })
    }

    /// Number of story documents in the archive
    pub fn story_count(&self) -> usize {
        self.story_entries.len()
    }

    /// Iterate story records, decoding one document per step
    pub fn records(&mut self) -> StoryRecords<'_, R> {
        StoryRecords {
            reader: self,
            position: 0,
        }
    }

    /// Read the manifest without touching story payloads
    ///
    /// Returns `None` if the archive carries no manifest.
    pub fn manifest(&mut self) -> Result<Option<Vec<ManifestEntry>>, DecodeError> {
        let contents = match self.archive.by_name(MANIFEST_PATH) {
            Ok(mut entry) => read_entry(&mut entry, MANIFEST_PATH)?,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => {
                return Err(DecodeError::UnreadableEntry {
                    path: MANIFEST_PATH.to_string(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(DecodeError::MalformedManifest)
    }

    fn read_record(&mut self, index: usize) -> Result<StoryRecord, DecodeError> {
        let mut entry =
            self.archive
                .by_index(index)
                .map_err(|source| DecodeError::UnreadableEntry {
                    path: format!("entry #{}", index),
                    source,
                })?;
        let path = entry.name().to_string();
        let contents = read_entry(&mut entry, &path)?;

        let record: StoryRecord = serde_json::from_str(&contents)
            .map_err(|source| DecodeError::MalformedRecord {
                path: path.clone(),
                source,
            })?;
        if !is_safe_id(&record.id) {
            return Err(DecodeError::UnsafeId {
                path,
                id: record.id,
            });
        }
        Ok(record)
    }
}

fn read_entry(entry: &mut impl Read, path: &str) -> Result<String, DecodeError> {
    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|e| DecodeError::UnreadableEntry {
            path: path.to_string(),
            source: ZipError::Io(e),
        })?;
    Ok(contents)
}

/// Lazy iterator over the story documents of an archive
pub struct StoryRecords<'a, R: Read + Seek> {
    reader: &'a mut ArchiveReader<R>,
    position: usize,
}

impl<R: Read + Seek> Iterator for StoryRecords<'_, R> {
    type Item = Result<StoryRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.reader.story_entries.get(self.position)?;
        self.position += 1;
        Some(self.reader.read_record(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.reader.story_entries.len() - self.position;
        (remaining, Some(remaining))
    }
}
