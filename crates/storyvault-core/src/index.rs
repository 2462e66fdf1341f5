//! In-memory library index
//!
//! A session-local snapshot of the store used for listing, tag facets and
//! title search. It is rebuilt from [`RecordStore::get_all`] and may go stale
//! when another process writes to the same database.
//!
//! [`RecordStore::get_all`]: crate::storage::RecordStore::get_all

use std::collections::HashSet;

use crate::models::StoryRecord;

/// Pseudo-tag meaning "no tag filter"
pub const ALL_TAG: &str = "all";

/// Tag and title-search criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFilter {
    /// Exact tag to require; `None` or `"all"` disables tag filtering
    pub tag: Option<String>,
    /// Case-insensitive title substring
    pub search: Option<String>,
}

impl StoryFilter {
    pub fn new(tag: Option<String>, search: Option<String>) -> Self {
        Self { tag, search }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            search: None,
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            tag: None,
            search: Some(search.into()),
        }
    }

    /// Whether the filter lets every record through
    pub fn is_empty(&self) -> bool {
        self.active_tag().is_none() && self.needle().is_none()
    }

    /// Check a record against both criteria
    pub fn matches(&self, record: &StoryRecord) -> bool {
        if let Some(tag) = self.active_tag() {
            if !record.has_tag(tag) {
                return false;
            }
        }
        if let Some(needle) = self.needle() {
            if !record.title.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }

    fn active_tag(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty() && *t != ALL_TAG)
    }

    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Ordered snapshot of the library
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    stories: Vec<StoryRecord>,
}

impl LibraryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot, newest-created first
    ///
    /// Ordering uses the numeric part of each id; ties keep store order.
    pub fn reload(&mut self, mut records: Vec<StoryRecord>) {
        records.sort_by_key(|r| std::cmp::Reverse(r.sort_key()));
        self.stories = records;
    }

    /// All stories in display order
    pub fn stories(&self) -> &[StoryRecord] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Look up a story in the snapshot
    pub fn get(&self, id: &str) -> Option<&StoryRecord> {
        self.stories.iter().find(|s| s.id == id)
    }

    /// Stories matching a filter, in display order
    pub fn filter(&self, filter: &StoryFilter) -> Vec<&StoryRecord> {
        self.stories.iter().filter(|s| filter.matches(s)).collect()
    }

    /// `"all"` followed by every tag in first-seen order
    pub fn distinct_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut tags = vec![ALL_TAG.to_string()];
        seen.insert(ALL_TAG);

        for tag in self.stories.iter().flat_map(|s| s.tags.iter()) {
            if seen.insert(tag.as_str()) {
                tags.push(tag.clone());
            }
        }
        tags
    }
}
