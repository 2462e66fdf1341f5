//! Front-end collaborator surface
//!
//! The library never presents anything itself. Confirmation prompts,
//! selection feedback and delivery of story text are delegated to a
//! [`LibraryHost`] supplied by the front-end.

use anyhow::Result;

use crate::models::StoryRecord;

/// Callbacks the library invokes on its front-end
pub trait LibraryHost: Send + Sync {
    /// Ask the user to approve a destructive or bulk operation
    fn confirm(&self, message: &str) -> bool;

    /// A story became the current selection
    fn record_selected(&self, record: &StoryRecord);

    /// Hand story content to the chat input
    fn send_text(&self, content: &str) -> Result<()>;
}

/// Host that approves everything and discards sent text
///
/// Useful for scripted use where no prompt can be shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl LibraryHost for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }

    fn record_selected(&self, _record: &StoryRecord) {}

    fn send_text(&self, _content: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use anyhow::{bail, Result};

    use super::LibraryHost;
    use crate::models::StoryRecord;

    /// Host that records every callback
    pub struct RecordingHost {
        answer: bool,
        fail_send: bool,
        pub prompts: Mutex<Vec<String>>,
        pub selected: Mutex<Vec<String>>,
        pub sent: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        pub fn approving() -> Self {
            Self::answering(true)
        }

        pub fn declining() -> Self {
            Self::answering(false)
        }

        fn answering(answer: bool) -> Self {
            Self {
                answer,
                fail_send: false,
                prompts: Mutex::new(Vec::new()),
                selected: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_send(mut self) -> Self {
            self.fail_send = true;
            self
        }

        pub fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl LibraryHost for RecordingHost {
        fn confirm(&self, message: &str) -> bool {
            self.prompts.lock().unwrap().push(message.to_string());
            self.answer
        }

        fn record_selected(&self, record: &StoryRecord) {
            self.selected.lock().unwrap().push(record.id.clone());
        }

        fn send_text(&self, content: &str) -> Result<()> {
            if self.fail_send {
                bail!("chat input unavailable");
            }
            self.sent.lock().unwrap().push(content.to_string());
            Ok(())
        }
    }
}
