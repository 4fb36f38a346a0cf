//! UI-facing events published by the session controller.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::draft::SessionDraft;
use super::model::{ChatMessage, TodoItem};

/// Connection lifecycle as surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Speaking,
    Listening,
    Disconnected,
    Error,
}

/// High-level events the controller publishes to UI subscribers.
///
/// Workspace updates carry a full snapshot of the draft (diff-free
/// replacement); subscribers never receive incremental patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// The workspace portion of the draft was replaced by a tool call.
    WorkspaceUpdated { draft: SessionDraft },
    /// The checklist was replaced; `newly_completed` lists ids that just
    /// flipped to done (for transition effects).
    TodosUpdated {
        todos: Vec<TodoItem>,
        newly_completed: Vec<String>,
    },
    /// A transcript line was appended.
    TranscriptAppended { message: ChatMessage },
    /// The connection status changed.
    StatusChanged { status: ConnectionStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ConnectionStatus::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
        assert_eq!(ConnectionStatus::Listening.to_string(), "listening");
    }

    #[test]
    fn events_are_internally_tagged() {
        let event = UiEvent::StatusChanged {
            status: ConnectionStatus::Idle,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "status_changed");
        assert_eq!(value["status"], "idle");
    }
}
