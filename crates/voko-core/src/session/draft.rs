//! The live session draft and its update operations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::normalize::{TodoUpdate, WorkspaceUpdate};
use crate::session::model::{Impact, Okr, Output, TodoItem, WorkspaceSection, newly_completed};
use crate::session::transcript::Transcript;

/// The canonical in-memory state of the current coaching session.
///
/// Owned exclusively by the session controller during a live session; the
/// persistence layer only ever sees serialized copies (copy-out/copy-in,
/// never shared references).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionDraft {
    pub messages: Transcript,
    pub todos: Vec<TodoItem>,
    pub impact: Impact,
    pub outcome: Option<Okr>,
    pub output: Output,
    #[serde(default)]
    pub sections: Vec<WorkspaceSection>,
    pub understanding: String,
}

impl SessionDraft {
    /// True when any workspace field holds draft content. This is the
    /// mid-draft condition for resume-scenario selection; the transcript
    /// alone does not count as draft content.
    pub fn has_draft_content(&self) -> bool {
        !self.todos.is_empty()
            || self.outcome.is_some()
            || self.impact.strategy.is_some()
            || !self.impact.kpis.is_empty()
            || !self.output.initiatives.is_empty()
            || !self.sections.is_empty()
    }

    /// Replaces the checklist wholesale and returns the set of ids that
    /// became completed with this update.
    ///
    /// An omitted `understanding` preserves the existing memo; an explicit
    /// empty string clears it.
    pub fn apply_todos(&mut self, update: TodoUpdate) -> HashSet<String> {
        let fresh = newly_completed(&self.todos, &update.todos);
        self.todos = update.todos;
        if let Some(understanding) = update.understanding {
            self.understanding = understanding;
        }
        fresh
    }

    /// Applies a workspace update with full-replacement semantics per field.
    ///
    /// Tool calls are wholesale state sync, not incremental patches: every
    /// field the agent sent replaces the local value entirely, and every
    /// field it omitted is left untouched.
    pub fn apply_workspace(&mut self, update: WorkspaceUpdate) {
        if let Some(impact) = update.impact {
            self.impact = impact;
        }
        if let Some(outcome) = update.outcome {
            self.outcome = Some(outcome);
        }
        if let Some(output) = update.output {
            self.output = output;
        }
        if let Some(sections) = update.sections {
            self.sections = sections;
        }
        if let Some(understanding) = update.understanding {
            self.understanding = understanding;
        }
    }

    /// Clears every field back to the fresh-session state.
    pub fn reset(&mut self) {
        *self = SessionDraft::default();
    }
}
