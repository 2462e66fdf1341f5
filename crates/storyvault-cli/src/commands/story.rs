//! Story command handlers

use anyhow::{anyhow, bail, Result};
use clap::Args;

use storyvault_core::{CommandOutcome, Library, LibraryCommand, StoryDraft, StoryFilter};

use crate::editor::{self, prompt_optional, prompt_with_default};
use crate::host::TerminalHost;
use crate::output::Output;

/// Story fields given on the command line
#[derive(Args, Debug, Default, Clone)]
pub struct StoryFields {
    /// Story title
    #[arg(short = 'T', long)]
    pub title: Option<String>,
    /// Author (defaults to the configured author)
    #[arg(short, long)]
    pub author: Option<String>,
    /// Comma-separated tags
    #[arg(short, long)]
    pub tags: Option<String>,
    /// Story content (opens editor if not provided)
    #[arg(short, long)]
    pub content: Option<String>,
}

impl StoryFields {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.tags.is_none() && self.content.is_none()
    }

    /// Overlay the given fields on a draft
    fn apply(self, mut draft: StoryDraft) -> StoryDraft {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(author) = self.author {
            draft = draft.with_author(author);
        }
        if let Some(tags) = self.tags {
            draft = draft.with_tag_list(&tags);
        }
        if let Some(content) = self.content {
            draft.content = content;
        }
        draft
    }
}

/// List stories, optionally filtered by tag and title search
pub fn list(
    library: &Library,
    tag: Option<String>,
    search: Option<String>,
    output: &Output,
) -> Result<()> {
    let stories = library.filter(&StoryFilter::new(tag, search));
    output.print_stories(&stories);
    Ok(())
}

/// Show a single story
pub async fn show(library: &Library, id: String, output: &Output) -> Result<()> {
    let id = resolve_story_id(library, &id)?;
    let story = library.get_story(&id).await?;
    output.print_story(&story);
    Ok(())
}

/// Create a new story
pub async fn create(
    library: &mut Library,
    host: &TerminalHost,
    fields: StoryFields,
    output: &Output,
) -> Result<()> {
    let mut fields = fields;
    if fields.title.is_none() {
        fields.title = prompt_optional("Title")?;
    }
    if fields.content.is_none() {
        fields.content = Some(editor::edit_text("")?.trim_end().to_string());
    }

    let draft = fields.apply(StoryDraft::default());

    match library.execute(LibraryCommand::Create(draft), host).await? {
        CommandOutcome::Saved(story) => {
            output.success(&format!("Created story: {}", story.id));
            output.print_story(&story);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

/// Edit a story
///
/// With no fields given, prompts for each one and opens the editor on the
/// current content.
pub async fn edit(
    library: &mut Library,
    host: &TerminalHost,
    id: String,
    fields: StoryFields,
    output: &Output,
) -> Result<()> {
    let id = resolve_story_id(library, &id)?;
    let existing = library.get_story(&id).await?;
    let mut draft = StoryDraft::from(&existing);

    if fields.is_empty() {
        println!("Editing story: {}", existing.id);
        println!("Press Enter to keep current value, or type new value.\n");

        if let Some(title) = prompt_with_default("Title", &existing.title)? {
            draft.title = title;
        }
        if let Some(author) = prompt_with_default("Author", &existing.author)? {
            draft = draft.with_author(author);
        }
        if let Some(tags) = prompt_with_default("Tags (comma-separated)", &existing.tags.join(", "))? {
            draft = draft.with_tag_list(&tags);
        }
        draft.content = editor::edit_text(&existing.content)?.trim_end().to_string();
    } else {
        draft = fields.apply(draft);
    }

    match library
        .execute(LibraryCommand::Edit { id, draft }, host)
        .await?
    {
        CommandOutcome::Saved(story) => {
            output.success("Story updated");
            output.print_story(&story);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

/// Delete a story
pub async fn delete(
    library: &mut Library,
    host: &TerminalHost,
    id: String,
    output: &Output,
) -> Result<()> {
    let id = resolve_story_id(library, &id)?;

    match library.execute(LibraryCommand::Delete { id }, host).await? {
        CommandOutcome::Deleted { id } => {
            output.success(&format!("Deleted story: {}", id));
            Ok(())
        }
        CommandOutcome::Cancelled => {
            output.message("Cancelled.");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

/// Send a story's content to the chat input
pub async fn send(
    library: &mut Library,
    host: &TerminalHost,
    id: String,
    output: &Output,
) -> Result<()> {
    let id = resolve_story_id(library, &id)?;
    library
        .execute(LibraryCommand::Select { id }, host)
        .await?;

    match library.execute(LibraryCommand::SendSelected, host).await? {
        CommandOutcome::Sent { id } => {
            if library.config().send_command.is_some() {
                output.success(&format!("Sent story: {}", id));
            }
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

/// Resolve a story id (exact match or unique prefix)
fn resolve_story_id(library: &Library, id: &str) -> Result<String> {
    let stories = library.index().stories();

    if stories.iter().any(|s| s.id == id) {
        return Ok(id.to_string());
    }

    let matches: Vec<_> = stories.iter().filter(|s| s.id.starts_with(id)).collect();

    match matches.len() {
        0 => bail!("No story found matching: {}", id),
        1 => Ok(matches[0].id.clone()),
        _ => {
            eprintln!("Multiple stories match '{}':", id);
            for story in &matches {
                eprintln!("  {} - {}", story.id, story.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

pub(crate) fn unexpected(outcome: CommandOutcome) -> anyhow::Error {
    anyhow!("Unexpected command outcome: {:?}", outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storyvault_core::{Config, RecordStore, SqliteRecordStore, StoryRecord};

    async fn library_with(ids: &[&str]) -> Library {
        let store = Arc::new(SqliteRecordStore::in_memory());
        for id in ids {
            store
                .put(&StoryRecord::new(*id, format!("Title {}", id), "c"))
                .await
                .unwrap();
        }
        let mut library = Library::with_store(store, Config::default());
        library.reload().await.unwrap();
        library
    }

    #[tokio::test]
    async fn test_resolve_exact_and_prefix() {
        let library = library_with(&["story-100", "story-200", "imported"]).await;

        assert_eq!(resolve_story_id(&library, "story-100").unwrap(), "story-100");
        assert_eq!(resolve_story_id(&library, "imp").unwrap(), "imported");
        assert!(resolve_story_id(&library, "story-").is_err());
        assert!(resolve_story_id(&library, "missing").is_err());
    }

    #[test]
    fn test_fields_overlay_draft() {
        let fields = StoryFields {
            title: Some("New".into()),
            tags: Some("a, b".into()),
            ..StoryFields::default()
        };
        let draft = fields.apply(StoryDraft::new("Old", "kept").with_author("Ann"));

        assert_eq!(draft.title, "New");
        assert_eq!(draft.content, "kept");
        assert_eq!(draft.author.as_deref(), Some("Ann"));
        assert_eq!(draft.tags, vec!["a", "b"]);
    }
}
