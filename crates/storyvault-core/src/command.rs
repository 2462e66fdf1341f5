//! Command objects exchanged with the front-end
//!
//! Front-ends describe what the user asked for as a [`LibraryCommand`] and
//! hand it to [`crate::Library::execute`], which answers with a
//! [`CommandOutcome`].

use crate::backup::{ExportOutcome, ImportMode, ImportSummary};
use crate::index::StoryFilter;
use crate::models::{StoryDraft, StoryRecord};

/// A user action against the library
#[derive(Debug, Clone)]
pub enum LibraryCommand {
    /// Rebuild the index from the store
    Reload,
    /// Make a story the current selection
    Select { id: String },
    Create(StoryDraft),
    Edit { id: String, draft: StoryDraft },
    Delete { id: String },
    /// Import raw archive bytes
    Import { archive: Vec<u8>, mode: ImportMode },
    Export { scope: StoryFilter },
    /// Send the selected story's content to the host
    SendSelected,
}

impl LibraryCommand {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            LibraryCommand::Reload => "reload",
            LibraryCommand::Select { .. } => "select",
            LibraryCommand::Create(_) => "create",
            LibraryCommand::Edit { .. } => "edit",
            LibraryCommand::Delete { .. } => "delete",
            LibraryCommand::Import { .. } => "import",
            LibraryCommand::Export { .. } => "export",
            LibraryCommand::SendSelected => "send",
        }
    }
}

/// What a command did
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Reloaded { count: usize },
    Selected(StoryRecord),
    /// A created or edited story as stored
    Saved(StoryRecord),
    Deleted { id: String },
    Imported(ImportSummary),
    Exported(ExportOutcome),
    Sent { id: String },
    /// The user declined the confirmation prompt
    Cancelled,
}
