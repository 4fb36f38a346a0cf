//! Voko core: the client-side domain of the voice OKR companion.
//!
//! This crate holds everything with real invariants: the typed view model
//! of a coaching session, the normalization layer that turns the remote
//! agent's loosely-typed tool-call payloads into that view model, the
//! versioned persisted-state schema, and the pure resume-scenario selection
//! used at connection time. It is free of I/O; storage and transport live
//! in the infrastructure and interaction crates.

pub mod error;
pub mod normalize;
pub mod persisted;
pub mod repository;
pub mod resume;
pub mod session;

// Re-export common error type
pub use error::{Result, VokoError};
pub use persisted::{Language, PersistedState, SCHEMA_VERSION};
pub use resume::{ResumeScenario, select_scenario};
