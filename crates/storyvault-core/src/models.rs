//! Data models for StoryVault
//!
//! Defines the story record stored in the library, the draft used by the
//! create and edit flows, and the manifest entry written into archives.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Author recorded when a story does not name one
pub const DEFAULT_AUTHOR: &str = "Local User";

/// Prefix of locally generated story ids
pub const STORY_ID_PREFIX: &str = "story";

/// A single library entry
///
/// Ids are opaque strings. Locally created stories use
/// `story-<creation millis>`, imported stories keep whatever id the archive
/// carried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoryRecord {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Author name
    #[serde(default = "default_author")]
    pub author: String,
    /// Tags for organization, in entry order
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,
    /// Text sent to the chat input
    pub content: String,
}

impl StoryRecord {
    /// Create a record with an explicit id
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: DEFAULT_AUTHOR.to_string(),
            tags: Vec::new(),
            content: content.into(),
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set all tags (replacing existing)
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether the record carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Numeric component of the id used for newest-first ordering
    ///
    /// Reads the segment after the first `-`; ids without a numeric
    /// segment sort as 0.
    pub fn sort_key(&self) -> i64 {
        self.id
            .split('-')
            .nth(1)
            .and_then(|segment| segment.trim().parse::<i64>().ok())
            .unwrap_or(0)
    }

    /// Manifest entry for this record (content omitted)
    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// One line of an archive manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,
}

/// User-supplied fields of a create or edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub content: String,
}

impl StoryDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set tags from a comma-separated string
    pub fn with_tag_list(mut self, tags: &str) -> Self {
        self.tags = parse_tags(tags);
        self
    }

    /// Reject drafts with an empty title or content
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }

    /// Build the record stored for this draft
    ///
    /// A blank author falls back to `default_author`.
    pub fn into_record(
        self,
        id: impl Into<String>,
        default_author: &str,
    ) -> Result<StoryRecord, ValidationError> {
        self.validate()?;
        let author = self
            .author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| default_author.to_string());

        Ok(StoryRecord {
            id: id.into(),
            title: self.title,
            author,
            tags: self.tags,
            content: self.content,
        })
    }
}

impl From<&StoryRecord> for StoryDraft {
    fn from(record: &StoryRecord) -> Self {
        Self {
            title: record.title.clone(),
            author: Some(record.author.clone()),
            tags: record.tags.clone(),
            content: record.content.clone(),
        }
    }
}

/// Rejected create or edit input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Story title cannot be empty")]
    EmptyTitle,

    #[error("Story content cannot be empty")]
    EmptyContent,
}

/// Split a comma-separated tag list, dropping blank entries
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Generate a story id from a creation timestamp in milliseconds
pub fn story_id(millis: i64) -> String {
    format!("{}-{}", STORY_ID_PREFIX, millis)
}

/// Generate a story id for the current time
pub fn new_story_id() -> String {
    story_id(Utc::now().timestamp_millis())
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

/// Older records may carry `"tags": null`
fn nullable_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
