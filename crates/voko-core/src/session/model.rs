//! View-model types for one coaching session.
//!
//! These are the canonical, strongly-typed shapes the rest of the application
//! operates on. They are decoupled from both the wire format the remote agent
//! sends (see the normalization layer) and from any rendering concern.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Coach,
}

/// A single turn of the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn now(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One step of the coaching checklist. The list is replaced wholesale on
/// every `update_todos` tool call; `id` is the join key across replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// A key performance indicator attached to the impact section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    pub description: String,
}

/// The "impact" workspace section: the strategy the OKR contributes to,
/// plus the KPIs it should move.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Impact {
    pub strategy: Option<String>,
    pub kpis: Vec<Kpi>,
}

/// A single measurable key result of the draft OKR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyResult {
    pub label: String,
    pub text: String,
    /// Progress percentage, clamped to 0-100.
    pub progress: u8,
}

/// The draft OKR. Absence of the whole value means "no draft yet", which is
/// distinct from an OKR with an empty objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Okr {
    pub objective: String,
    pub key_results: Vec<KeyResult>,
}

/// An initiative attached to the output section, linked to a key result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    pub text: String,
    pub linked_kr: String,
}

/// The "output" workspace section: concrete initiatives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Output {
    pub initiatives: Vec<Initiative>,
}

/// Progress status of a workspace section (section-oriented schema variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

/// A workspace section as sent by the section-oriented agent variant.
/// Owned entirely by the remote agent and re-sent wholesale each call; the
/// client never mutates it except by full replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSection {
    pub id: String,
    pub title: String,
    pub status: SectionStatus,
    pub summary: String,
}

/// An immutable snapshot of a finished coaching session, appended to the
/// cross-session history when the user explicitly archives the current draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub okr: Okr,
    pub impact: Impact,
    pub output: Output,
    pub understanding: String,
    pub messages: Vec<ChatMessage>,
}

/// Computes the set of todo ids that are completed in `next` but were not
/// completed in `prev`. Used to signal freshly-finished steps to the UI.
pub fn newly_completed(prev: &[TodoItem], next: &[TodoItem]) -> HashSet<String> {
    let prev_done: HashSet<&str> = prev
        .iter()
        .filter(|t| t.completed)
        .map(|t| t.id.as_str())
        .collect();

    next.iter()
        .filter(|t| t.completed && !prev_done.contains(t.id.as_str()))
        .map(|t| t.id.clone())
        .collect()
}
