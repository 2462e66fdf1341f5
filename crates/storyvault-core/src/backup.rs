//! Bulk import and export
//!
//! Import merges an archive into the store under one of two policies:
//!
//! - **Replace**: clear the store, then write every archive story
//! - **Append**: write only stories whose id and title are not already in
//!   the store
//!
//! The archive layout is validated before the store is touched. Story
//! documents are then decoded and written one by one; if a document turns
//! out to be malformed the import stops, and stories already written stay.

use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Seek};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveReader};
use crate::error::{LibraryError, LibraryResult};
use crate::index::StoryFilter;
use crate::storage::RecordStore;

/// Merge policy for imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Wipe the library, then load the archive
    Replace,
    /// Add only stories not already present
    Append,
}

impl ImportMode {
    /// Question put to the user before importing
    pub fn confirmation_message(&self) -> &'static str {
        match self {
            ImportMode::Replace => {
                "This will erase your current library and replace it with the archive contents. Continue?"
            }
            ImportMode::Append => "This will add new stories from the archive to your library. Continue?",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Replace => write!(f, "replace"),
            ImportMode::Append => write!(f, "append"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(ImportMode::Replace),
            "append" => Ok(ImportMode::Append),
            other => Err(format!(
                "Unknown import mode '{}'. Use 'replace' or 'append'.",
                other
            )),
        }
    }
}

/// How an import merges into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub mode: ImportMode,
    /// In append mode, also skip stories whose title already exists
    /// under a different id
    pub dedup_titles: bool,
}

impl ImportOptions {
    pub fn new(mode: ImportMode) -> Self {
        Self {
            mode,
            dedup_titles: true,
        }
    }

    pub fn replace() -> Self {
        Self::new(ImportMode::Replace)
    }

    pub fn append() -> Self {
        Self::new(ImportMode::Append)
    }

    pub fn with_title_dedup(mut self, dedup_titles: bool) -> Self {
        self.dedup_titles = dedup_titles;
        self
    }
}

/// Counts reported by a finished import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
}

/// A produced backup archive
#[derive(Debug, Clone)]
pub struct ArchiveExport {
    /// Suggested file name, `<prefix>-Backup-<YYYYMMDDHHMMSS>.zip`
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub record_count: usize,
}

/// Result of an export request
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    Archive(ArchiveExport),
    /// Nothing matched; callers should warn instead of writing an empty archive
    EmptyLibrary,
}

/// Import an archive into the store
pub async fn import_archive<R: Read + Seek>(
    store: &dyn RecordStore,
    reader: R,
    options: ImportOptions,
) -> LibraryResult<ImportSummary> {
    // Layout problems surface here, before any write
    let mut archive = ArchiveReader::new(reader)?;
    debug!(
        "Importing {} story files in {} mode",
        archive.story_count(),
        options.mode
    );

    let (existing_ids, existing_titles) = match options.mode {
        ImportMode::Replace => {
            store.clear().await?;
            info!("Library cleared for replace import");
            (HashSet::new(), HashSet::new())
        }
        ImportMode::Append => {
            let existing = store.get_all().await?;
            let ids: HashSet<String> = existing.iter().map(|r| r.id.clone()).collect();
            let titles: HashSet<String> = existing.into_iter().map(|r| r.title).collect();
            (ids, titles)
        }
    };

    let mut summary = ImportSummary::default();

    for item in archive.records() {
        let record = match item {
            Ok(record) => record,
            Err(source) => {
                warn!(
                    "Import aborted after {} added, {} skipped: {}",
                    summary.added, summary.skipped, source
                );
                return Err(LibraryError::ImportAborted {
                    added: summary.added,
                    skipped: summary.skipped,
                    source,
                });
            }
        };

        if options.mode == ImportMode::Append {
            let duplicate_id = existing_ids.contains(&record.id);
            let duplicate_title = options.dedup_titles && existing_titles.contains(&record.title);
            if duplicate_id || duplicate_title {
                debug!("Skipping existing story {} ({})", record.id, record.title);
                summary.skipped += 1;
                continue;
            }
        }

        store.put(&record).await?;
        summary.added += 1;
    }

    info!(
        "Import complete: {} added, {} skipped",
        summary.added, summary.skipped
    );
    Ok(summary)
}

/// Export stories matching `scope` into a backup archive
pub async fn export_archive(
    store: &dyn RecordStore,
    scope: &StoryFilter,
    prefix: &str,
) -> LibraryResult<ExportOutcome> {
    let records: Vec<_> = store
        .get_all()
        .await?
        .into_iter()
        .filter(|r| scope.matches(r))
        .collect();

    if records.is_empty() {
        warn!("Export requested but no stories matched");
        return Ok(ExportOutcome::EmptyLibrary);
    }

    let bytes = archive::encode(&records)?;
    let file_name = archive::backup_file_name(prefix, Utc::now());
    info!("Exported {} stories to {}", records.len(), file_name);

    Ok(ExportOutcome::Archive(ArchiveExport {
        file_name,
        bytes,
        record_count: records.len(),
    }))
}
