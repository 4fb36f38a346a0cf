//! Append-only transcript of the live conversation.

use serde::{Deserialize, Serialize};

use super::model::{ChatMessage, Role};

/// Append-only, timestamped, role-tagged log of the exchange with the agent.
///
/// Messages are never mutated once appended; the whole transcript is cleared
/// only when the session is archived or reset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<ChatMessage>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new turn, stamped with the current time.
    pub fn append(&mut self, role: Role, text: impl Into<String>) -> &ChatMessage {
        self.0.push(ChatMessage::now(role, text));
        // Safe to unwrap because we just pushed an element
        self.0.last().unwrap()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Copies the messages out, e.g. for an archival snapshot.
    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.0.clone()
    }
}
