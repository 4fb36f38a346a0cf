//! Unified path management for voko's on-disk footprint.
//!
//! Everything the client persists lives under a single base directory
//! (`~/.voko` by default). Tests point this at a temp directory.

use std::path::{Path, PathBuf};

use voko_core::error::{Result, VokoError};

/// Resolves the paths of voko's storage slot and configuration file.
///
/// # Directory Structure
///
/// ```text
/// ~/.voko/
/// ├── state.json     # the single versioned persisted-state slot
/// └── config.toml    # optional configuration overlay
/// ```
#[derive(Debug, Clone)]
pub struct VokoPaths {
    base_dir: PathBuf,
}

impl VokoPaths {
    /// Creates paths rooted at an explicit base directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Creates paths at the default location (`~/.voko`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_location() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| VokoError::config("Cannot find home directory"))?;
        Ok(Self::new(home_dir.join(".voko")))
    }

    /// Ensures the base directory exists.
    pub fn ensure_base_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| VokoError::io(format!("Failed to create {:?}: {e}", self.base_dir)))?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the single persisted-state slot.
    pub fn state_file(&self) -> PathBuf {
        self.base_dir.join("state.json")
    }

    /// Path of the optional configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }
}
