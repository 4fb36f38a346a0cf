//! Voko infrastructure: storage, debounced persistence, paths and config.

pub mod config;
pub mod debounce;
pub mod paths;
pub mod state_store;

pub use config::{ClientConfig, DEFAULT_API_BASE};
pub use debounce::{DEFAULT_QUIET_PERIOD, DebouncedSaver};
pub use paths::VokoPaths;
pub use state_store::JsonStateStore;
