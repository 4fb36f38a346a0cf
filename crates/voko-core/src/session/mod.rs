//! Session domain: view-model types, the live draft, transcript and events.

pub mod draft;
pub mod event;
pub mod model;
pub mod transcript;

pub use draft::SessionDraft;
pub use event::{ConnectionStatus, UiEvent};
pub use model::{
    ChatMessage, CompletedSession, Impact, Initiative, KeyResult, Kpi, Okr, Output, Role,
    SectionStatus, TodoItem, WorkspaceSection, newly_completed,
};
pub use transcript::Transcript;
