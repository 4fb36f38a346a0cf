//! The durable, versioned snapshot of everything the client remembers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::draft::SessionDraft;
use crate::session::model::CompletedSession;

/// Schema version of the persisted blob. A stored value whose `version`
/// field does not exactly match this constant is discarded wholesale and
/// treated as absent - there is no field-by-field migration.
pub const SCHEMA_VERSION: u32 = 3;

/// Interface language of the coaching session, forced onto every
/// connection as an agent override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    En,
}

impl Language {
    /// The BCP-47-ish code the remote platform expects.
    pub fn code(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
        }
    }
}

/// Everything written to the single storage slot.
///
/// `user_context` is a cross-session accumulator: whenever a session
/// produces a non-empty "understanding" memo it overwrites this field, and
/// it survives session archival (but not a factory reset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub version: u32,
    pub language: Language,
    pub current_session: SessionDraft,
    pub completed_sessions: Vec<CompletedSession>,
    pub user_context: String,
}

impl PersistedState {
    /// Returns a fully-populated empty state carrying the current schema
    /// version. Used for first-run and for explicit reset.
    pub fn new_default(language: Language) -> Self {
        Self {
            version: SCHEMA_VERSION,
            language,
            current_session: SessionDraft::default(),
            completed_sessions: Vec::new(),
            user_context: String::new(),
        }
    }

    /// Accumulates a session "understanding" memo into the cross-session
    /// user context. Empty memos never clobber earlier context.
    pub fn accumulate_understanding(&mut self, understanding: &str) {
        if !understanding.is_empty() {
            self.user_context = understanding.to_owned();
        }
    }

    /// Archives the current draft into the history ("start new OKR").
    ///
    /// Only performed when an OKR draft exists; the snapshot gets a fresh
    /// unique id and the current timestamp, every current-session field is
    /// reset, and `user_context` is deliberately preserved.
    ///
    /// Returns the id of the archived session, or `None` when there was no
    /// OKR to archive (in which case nothing changes).
    pub fn archive_current(&mut self) -> Option<String> {
        let okr = self.current_session.outcome.clone()?;

        let id = Uuid::new_v4().to_string();
        let understanding = self.current_session.understanding.clone();
        let snapshot = CompletedSession {
            id: id.clone(),
            timestamp: Utc::now(),
            okr,
            impact: self.current_session.impact.clone(),
            output: self.current_session.output.clone(),
            understanding: understanding.clone(),
            messages: self.current_session.messages.to_vec(),
        };

        self.accumulate_understanding(&understanding);
        self.completed_sessions.push(snapshot);
        self.current_session.reset();

        Some(id)
    }

    /// Factory reset: clears the current session, the whole history and the
    /// accumulated user context. Distinct from archival.
    pub fn reset_all(&mut self) {
        *self = PersistedState::new_default(self.language);
    }

    /// The most recent archived objectives, oldest first, capped at `limit`.
    /// Used to summarize history in the returning-user prompt.
    pub fn recent_objectives(&self, limit: usize) -> Vec<&str> {
        let skip = self.completed_sessions.len().saturating_sub(limit);
        self.completed_sessions[skip..]
            .iter()
            .map(|session| session.okr.objective.as_str())
            .collect()
    }
}
