//! Storage seam for the persisted state.
//!
//! The domain layer defines the interface; infrastructure provides the
//! file-backed implementation. Tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::persisted::PersistedState;

/// Durable key-value storage of the one persisted-state slot.
///
/// Implementations hold a serialized copy only - no shared mutable state
/// with the live view model.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Reads the slot. Returns `None` for "no usable saved state": a missing
    /// slot, unparseable content, or a schema-version mismatch all look the
    /// same to the caller.
    async fn load(&self) -> Result<Option<PersistedState>>;

    /// Serializes and overwrites the slot.
    async fn save(&self, state: &PersistedState) -> Result<()>;

    /// Deletes the slot unconditionally.
    async fn clear(&self) -> Result<()>;
}
