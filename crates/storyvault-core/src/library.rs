//! Library session
//!
//! The `Library` is the session context a front-end works against. It owns
//! the store handle, the in-memory index and the current selection, and
//! keeps the index in step with every mutation it performs.
//!
//! ## Usage
//!
//! ```ignore
//! let mut library = Library::open(Config::load()?).await?;
//!
//! let story = library.create_story(StoryDraft::new("Title", "Once upon a time")).await?;
//! library.select(&story.id, &host).await?;
//! library.send_selected(&host).await?;
//! ```

use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::backup::{self, ExportOutcome, ImportMode, ImportOptions, ImportSummary};
use crate::command::{CommandOutcome, LibraryCommand};
use crate::config::Config;
use crate::error::{LibraryError, LibraryResult};
use crate::host::LibraryHost;
use crate::index::{LibraryIndex, StoryFilter};
use crate::models::{story_id, StoryDraft, StoryRecord};
use crate::storage::{RecordStore, SqliteRecordStore};

/// A session over one story library
pub struct Library {
    store: Arc<dyn RecordStore>,
    index: LibraryIndex,
    selected: Option<StoryRecord>,
    config: Config,
}

impl Library {
    /// Open the library described by `config` and load its index
    pub async fn open(config: Config) -> LibraryResult<Self> {
        let store = Arc::new(SqliteRecordStore::from_config(&config));
        let mut library = Self::with_store(store, config);
        library.reload().await?;
        Ok(library)
    }

    /// Wrap an existing store; the index starts empty until [`Library::reload`]
    pub fn with_store(store: Arc<dyn RecordStore>, config: Config) -> Self {
        Self {
            store,
            index: LibraryIndex::new(),
            selected: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn index(&self) -> &LibraryIndex {
        &self.index
    }

    pub fn selected(&self) -> Option<&StoryRecord> {
        self.selected.as_ref()
    }

    /// Rebuild the index from the store
    ///
    /// The selection is refreshed too and dropped if its story is gone.
    pub async fn reload(&mut self) -> LibraryResult<usize> {
        let records = self.store.get_all().await?;
        self.index.reload(records);

        if let Some(current) = &self.selected {
            self.selected = self.index.get(&current.id).cloned();
        }

        debug!("Library index reloaded with {} stories", self.index.len());
        Ok(self.index.len())
    }

    /// Stories matching a filter, newest first
    pub fn filter(&self, filter: &StoryFilter) -> Vec<&StoryRecord> {
        self.index.filter(filter)
    }

    /// Tag facets, `"all"` first
    pub fn tags(&self) -> Vec<String> {
        self.index.distinct_tags()
    }

    /// Fetch a story straight from the store
    pub async fn get_story(&self, id: &str) -> LibraryResult<StoryRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    /// Make a story the current selection and notify the host
    pub async fn select(&mut self, id: &str, host: &dyn LibraryHost) -> LibraryResult<StoryRecord> {
        let record = self.get_story(id).await?;
        host.record_selected(&record);
        self.selected = Some(record.clone());
        Ok(record)
    }

    /// Validate and store a new story under a fresh id
    pub async fn create_story(&mut self, draft: StoryDraft) -> LibraryResult<StoryRecord> {
        draft.validate()?;

        let id = self.fresh_id().await?;
        let record = draft.into_record(id, &self.config.default_author)?;
        self.store.put(&record).await?;
        info!("Created story {} ({})", record.id, record.title);

        self.reload().await?;
        Ok(record)
    }

    /// Replace the fields of an existing story, keeping its id
    ///
    /// A draft without an author keeps the story's current author; a blank
    /// author falls back to the configured default.
    pub async fn edit_story(&mut self, id: &str, draft: StoryDraft) -> LibraryResult<StoryRecord> {
        draft.validate()?;

        let existing = self.get_story(id).await?;
        let fallback = match draft.author {
            None => existing.author,
            Some(_) => self.config.default_author.clone(),
        };
        let record = draft.into_record(id, &fallback)?;
        self.store.put(&record).await?;
        info!("Updated story {} ({})", record.id, record.title);

        self.reload().await?;
        Ok(record)
    }

    /// Delete a story after host confirmation
    ///
    /// Returns `false` when the user declined.
    pub async fn delete_story(&mut self, id: &str, host: &dyn LibraryHost) -> LibraryResult<bool> {
        let existing = self.get_story(id).await?;
        let prompt = format!("Delete \"{}\"? This cannot be undone.", existing.title);
        if !host.confirm(&prompt) {
            debug!("Delete of {} cancelled", id);
            return Ok(false);
        }

        self.store.delete(id).await?;
        info!("Deleted story {}", id);

        if self.selected.as_ref().is_some_and(|s| s.id == id) {
            self.selected = None;
        }
        self.reload().await?;
        Ok(true)
    }

    /// Import an archive after host confirmation
    ///
    /// Returns `None` when the user declined. The index is reloaded even
    /// when the import fails partway, since earlier writes are kept.
    pub async fn import_archive<R: Read + Seek>(
        &mut self,
        reader: R,
        mode: ImportMode,
        host: &dyn LibraryHost,
    ) -> LibraryResult<Option<ImportSummary>> {
        if !host.confirm(mode.confirmation_message()) {
            debug!("Import cancelled");
            return Ok(None);
        }

        let options =
            ImportOptions::new(mode).with_title_dedup(self.config.dedup_titles_on_append);
        let result = backup::import_archive(self.store.as_ref(), reader, options).await;

        let reloaded = self.reload().await;
        let summary = result?;
        reloaded?;
        Ok(Some(summary))
    }

    /// Export the stories matching `scope`
    pub async fn export_archive(&self, scope: &StoryFilter) -> LibraryResult<ExportOutcome> {
        backup::export_archive(self.store.as_ref(), scope, &self.config.backup_prefix).await
    }

    /// Hand the selected story's content to the host
    pub async fn send_selected(&self, host: &dyn LibraryHost) -> LibraryResult<&StoryRecord> {
        let record = self.selected.as_ref().ok_or(LibraryError::NothingSelected)?;
        host.send_text(&record.content)
            .map_err(|e| LibraryError::Send(format!("{:#}", e)))?;
        info!("Sent story {}", record.id);
        Ok(record)
    }

    /// Run a command object
    pub async fn execute(
        &mut self,
        command: LibraryCommand,
        host: &dyn LibraryHost,
    ) -> LibraryResult<CommandOutcome> {
        debug!("Executing {} command", command.name());

        let outcome = match command {
            LibraryCommand::Reload => CommandOutcome::Reloaded {
                count: self.reload().await?,
            },
            LibraryCommand::Select { id } => CommandOutcome::Selected(self.select(&id, host).await?),
            LibraryCommand::Create(draft) => CommandOutcome::Saved(self.create_story(draft).await?),
            LibraryCommand::Edit { id, draft } => {
                CommandOutcome::Saved(self.edit_story(&id, draft).await?)
            }
            LibraryCommand::Delete { id } => {
                if self.delete_story(&id, host).await? {
                    CommandOutcome::Deleted { id }
                } else {
                    CommandOutcome::Cancelled
                }
            }
            LibraryCommand::Import { archive, mode } => {
                match self.import_archive(Cursor::new(archive), mode, host).await? {
                    Some(summary) => CommandOutcome::Imported(summary),
                    None => CommandOutcome::Cancelled,
                }
            }
            LibraryCommand::Export { scope } => {
                CommandOutcome::Exported(self.export_archive(&scope).await?)
            }
            LibraryCommand::SendSelected => {
                let record = self.send_selected(host).await?;
                CommandOutcome::Sent {
                    id: record.id.clone(),
                }
            }
        };

        Ok(outcome)
    }

    /// Next free `story-<millis>` id, bumping the timestamp on collision
    async fn fresh_id(&self) -> LibraryResult<String> {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = story_id(millis);
            if self.store.get(&id).await?.is_none() {
                return Ok(id);
            }
            millis += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive;
    use crate::backup::test_support::FailingStore;
    use crate::host::test_support::RecordingHost;
    use crate::models::{ValidationError, DEFAULT_AUTHOR};

    fn library() -> Library {
        Library::with_store(Arc::new(SqliteRecordStore::in_memory()), Config::default())
    }

    #[tokio::test]
    async fn test_create_assigns_story_id() {
        let mut library = library();
        let story = library
            .create_story(StoryDraft::new("Title", "Body").with_tag_list("a, b,,"))
            .await
            .unwrap();

        assert!(story.id.starts_with("story-"));
        assert!(story.sort_key() > 0);
        assert_eq!(story.author, DEFAULT_AUTHOR);
        assert_eq!(story.tags, vec!["a", "b"]);
        assert_eq!(library.index().len(), 1);
    }

    #[tokio::test]
    async fn test_create_never_collides() {
        let mut library = library();
        let first = library.create_story(StoryDraft::new("One", "c")).await.unwrap();
        let second = library.create_story(StoryDraft::new("Two", "c")).await.unwrap();
        let third = library.create_story(StoryDraft::new("Three", "c")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(second.id, third.id);
        assert_eq!(library.store().count().await.unwrap(), 3);
        // Newest first
        assert_eq!(library.index().stories()[0].id, third.id);
    }

    #[tokio::test]
    async fn test_validation_rejects_empty_fields() {
        let mut library = library();

        let err = library
            .create_story(StoryDraft::new("", "content"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(ValidationError::EmptyTitle)));

        let err = library
            .create_story(StoryDraft::new("Title", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(ValidationError::EmptyContent)));

        assert_eq!(library.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_validation_happens_before_store() {
        // A store that fails every write would surface a storage error if touched
        let store = Arc::new(FailingStore::new(0));
        let mut library = Library::with_store(store, Config::default());

        let err = library
            .create_story(StoryDraft::new("Title", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_keeps_id() {
        let mut library = library();
        let story = library
            .create_story(StoryDraft::new("Old", "c").with_author("Ann"))
            .await
            .unwrap();

        let edited = library
            .edit_story(&story.id, StoryDraft::new("New", "d"))
            .await
            .unwrap();

        assert_eq!(edited.id, story.id);
        assert_eq!(edited.title, "New");
        assert_eq!(edited.author, "Ann");
        assert_eq!(library.store().count().await.unwrap(), 1);
        assert_eq!(library.index().get(&story.id).unwrap().title, "New");
    }

    #[tokio::test]
    async fn test_edit_with_blank_author_uses_default() {
        let mut library = library();
        let story = library
            .create_story(StoryDraft::new("T", "c").with_author("Ann"))
            .await
            .unwrap();

        let edited = library
            .edit_story(&story.id, StoryDraft::new("T", "c").with_author("  "))
            .await
            .unwrap();

        assert_eq!(edited.author, DEFAULT_AUTHOR);
        assert_eq!(library.get_story(&story.id).await.unwrap().author, DEFAULT_AUTHOR);
    }

    #[tokio::test]
    async fn test_edit_validation_leaves_record_unchanged() {
        let mut library = library();
        let story = library.create_story(StoryDraft::new("Keep", "c")).await.unwrap();

        let err = library
            .edit_story(&story.id, StoryDraft::new("", "c"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert_eq!(library.get_story(&story.id).await.unwrap().title, "Keep");
    }

    #[tokio::test]
    async fn test_edit_missing_story() {
        let mut library = library();
        let err = library
            .edit_story("story-1", StoryDraft::new("T", "c"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(id) if id == "story-1"));
    }

    #[tokio::test]
    async fn test_select_notifies_host() {
        let mut library = library();
        let host = RecordingHost::approving();
        let story = library.create_story(StoryDraft::new("T", "c")).await.unwrap();

        library.select(&story.id, &host).await.unwrap();

        assert_eq!(library.selected().unwrap().id, story.id);
        assert_eq!(*host.selected.lock().unwrap(), vec![story.id.clone()]);
    }

    #[tokio::test]
    async fn test_selection_follows_edits() {
        let mut library = library();
        let host = RecordingHost::approving();
        let story = library.create_story(StoryDraft::new("T", "c")).await.unwrap();
        library.select(&story.id, &host).await.unwrap();

        library
            .edit_story(&story.id, StoryDraft::new("T2", "c2"))
            .await
            .unwrap();

        assert_eq!(library.selected().unwrap().content, "c2");
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let mut library = library();
        let story = library.create_story(StoryDraft::new("T", "c")).await.unwrap();

        let declining = RecordingHost::declining();
        assert!(!library.delete_story(&story.id, &declining).await.unwrap());
        assert_eq!(declining.prompt_count(), 1);
        assert_eq!(library.store().count().await.unwrap(), 1);

        let approving = RecordingHost::approving();
        library.select(&story.id, &approving).await.unwrap();
        assert!(library.delete_story(&story.id, &approving).await.unwrap());
        assert_eq!(library.store().count().await.unwrap(), 0);
        assert!(library.selected().is_none());
        assert!(library.index().is_empty());
    }

    #[tokio::test]
    async fn test_import_cancelled_leaves_store() {
        let mut library = library();
        library.create_story(StoryDraft::new("Mine", "c")).await.unwrap();

        let bytes = archive::encode(&[StoryRecord::new("x", "X", "c")]).unwrap();
        let host = RecordingHost::declining();
        let summary = library
            .import_archive(Cursor::new(bytes), ImportMode::Replace, &host)
            .await
            .unwrap();

        assert!(summary.is_none());
        assert_eq!(
            *host.prompts.lock().unwrap(),
            vec![ImportMode::Replace.confirmation_message().to_string()]
        );
        assert_eq!(library.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_import_reloads_index() {
        let mut library = library();
        let host = RecordingHost::approving();
        let bytes = archive::encode(&[
            StoryRecord::new("story-5", "Five", "c").with_tags(["t"]),
            StoryRecord::new("story-9", "Nine", "c"),
        ])
        .unwrap();

        let summary = library
            .import_archive(Cursor::new(bytes), ImportMode::Append, &host)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary, ImportSummary { added: 2, skipped: 0 });
        let ids: Vec<_> = library.index().stories().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["story-9", "story-5"]);
        assert_eq!(library.tags(), vec!["all", "t"]);
    }

    #[tokio::test]
    async fn test_import_respects_title_dedup_setting() {
        let config = Config {
            dedup_titles_on_append: false,
            ..Config::default()
        };
        let mut library = Library::with_store(Arc::new(SqliteRecordStore::in_memory()), config);
        let host = RecordingHost::approving();
        library.create_story(StoryDraft::new("Hello", "c")).await.unwrap();

        let bytes = archive::encode(&[StoryRecord::new("other", "Hello", "c")]).unwrap();
        let summary = library
            .import_archive(Cursor::new(bytes), ImportMode::Append, &host)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary, ImportSummary { added: 1, skipped: 0 });
    }

    #[tokio::test]
    async fn test_send_selected() {
        let mut library = library();
        let host = RecordingHost::approving();

        let err = library.send_selected(&host).await.unwrap_err();
        assert!(matches!(err, LibraryError::NothingSelected));

        let story = library.create_story(StoryDraft::new("T", "payload")).await.unwrap();
        library.select(&story.id, &host).await.unwrap();
        library.send_selected(&host).await.unwrap();
        assert_eq!(*host.sent.lock().unwrap(), vec!["payload".to_string()]);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let mut library = library();
        let host = RecordingHost::approving().failing_send();
        let story = library.create_story(StoryDraft::new("T", "c")).await.unwrap();
        library.select(&story.id, &host).await.unwrap();

        let err = library.send_selected(&host).await.unwrap_err();
        assert!(matches!(err, LibraryError::Send(msg) if msg.contains("unavailable")));
    }

    #[tokio::test]
    async fn test_execute_commands() {
        let mut library = library();
        let host = RecordingHost::approving();

        let outcome = library
            .execute(LibraryCommand::Create(StoryDraft::new("T", "c")), &host)
            .await
            .unwrap();
        let CommandOutcome::Saved(story) = outcome else {
            panic!("expected a saved story");
        };

        let outcome = library
            .execute(LibraryCommand::Select { id: story.id.clone() }, &host)
            .await
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Selected(_)));

        let outcome = library
            .execute(LibraryCommand::SendSelected, &host)
            .await
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Sent { id } if id == story.id));

        let outcome = library
            .execute(
                LibraryCommand::Export {
                    scope: StoryFilter::default(),
                },
                &host,
            )
            .await
            .unwrap();
        let CommandOutcome::Exported(ExportOutcome::Archive(export)) = outcome else {
            panic!("expected an archive");
        };

        let outcome = library
            .execute(LibraryCommand::Delete { id: story.id.clone() }, &host)
            .await
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Deleted { .. }));

        let outcome = library
            .execute(
                LibraryCommand::Import {
                    archive: export.bytes,
                    mode: ImportMode::Replace,
                },
                &host,
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CommandOutcome::Imported(ImportSummary { added: 1, skipped: 0 })
        ));

        let outcome = library.execute(LibraryCommand::Reload, &host).await.unwrap();
        assert!(matches!(outcome, CommandOutcome::Reloaded { count: 1 }));
    }

    #[tokio::test]
    async fn test_execute_cancelled_delete() {
        let mut library = library();
        let story = library.create_story(StoryDraft::new("T", "c")).await.unwrap();

        let outcome = library
            .execute(LibraryCommand::Delete { id: story.id }, &RecordingHost::declining())
            .await
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };

        {
            let mut library = Library::open(config.clone()).await.unwrap();
            library.create_story(StoryDraft::new("Kept", "c")).await.unwrap();
        }

        let library = Library::open(config).await.unwrap();
        assert_eq!(library.index().len(), 1);
        assert_eq!(library.index().stories()[0].title, "Kept");
    }
}
