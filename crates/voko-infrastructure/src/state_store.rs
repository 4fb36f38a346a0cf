//! File-backed implementation of the persisted-state slot.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use voko_core::error::{Result, VokoError};
use voko_core::persisted::{PersistedState, SCHEMA_VERSION};
use voko_core::repository::StateRepository;

use crate::paths::VokoPaths;

/// Stores the whole `PersistedState` as one pretty-printed JSON file.
///
/// Loads are version-gated: a stored blob whose `version` field does not
/// exactly equal [`SCHEMA_VERSION`] is discarded wholesale and reported as
/// absent. There is no field-by-field migration across versions.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Creates a store writing to an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the location `paths` resolves, making sure the
    /// parent directory exists.
    pub fn from_paths(paths: &VokoPaths) -> Result<Self> {
        paths.ensure_base_dir()?;
        Ok(Self::new(paths.state_file()))
    }
}

#[async_trait]
impl StateRepository for JsonStateStore {
    async fn load(&self) -> Result<Option<PersistedState>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(VokoError::storage(format!(
                    "Failed to read state file {:?}: {err}",
                    self.path
                )));
            }
        };

        // Check the version tag before committing to the full schema, so a
        // blob from another release is rejected rather than half-parsed.
        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("Discarding unparseable state file: {err}");
                return Ok(None);
            }
        };

        match value.get("version").and_then(serde_json::Value::as_u64) {
            Some(version) if version == u64::from(SCHEMA_VERSION) => {}
            other => {
                warn!(
                    "Discarding state with schema version {:?} (expected {})",
                    other, SCHEMA_VERSION
                );
                return Ok(None);
            }
        }

        match serde_json::from_value::<PersistedState>(value) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                warn!("Discarding state that failed to deserialize: {err}");
                Ok(None)
            }
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, json).await.map_err(|err| {
            VokoError::storage(format!(
                "Failed to write state file {:?}: {err}",
                self.path
            ))
        })?;
        debug!("Persisted state to {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(VokoError::storage(format!(
                "Failed to delete state file {:?}: {err}",
                self.path
            ))),
        }
    }
}
