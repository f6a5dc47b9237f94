//! The Activity Feed: an append-only, insertion-ordered list of messages.
//!
//! Entries are never removed, reordered or edited.

use crate::model::Message;

pub const GREETING: &str = "Hi 👋 Select a notebook, run Trackit, then summarize a log.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFeed {
    entries: Vec<Message>,
}

impl ActivityFeed {
    pub fn with_greeting() -> Self {
        Self {
            entries: vec![Message::assistant(GREETING)],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }

    /// Entries appended after the first `seen`.
    pub fn since(&self, seen: usize) -> &[Message] {
        &self.entries[seen.min(self.entries.len())..]
    }
}
