//! Client configuration.
//!
//! Configuration is explicit: the application constructs a [`ClientConfig`]
//! from the environment (optionally overlaid on `~/.voko/config.toml`) and
//! passes it into the controller. There are no credentials or agent ids
//! hardcoded anywhere in source.

use std::env;

use serde::Deserialize;

use voko_core::error::{Result, VokoError};
use voko_core::persisted::Language;

use crate::paths::VokoPaths;

/// Default API base of the hosted conversational platform.
pub const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";

/// Everything the session controller needs to reach the remote agent.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identifier of the provisioned coaching agent.
    pub agent_id: String,
    /// Base URL of the conversational platform.
    pub api_base: String,
    /// Server-held API key for signed-URL issuance. Absent means the
    /// bootstrap step is skipped and the public connection mode is used.
    pub api_key: Option<String>,
    /// Optional URL of a credential-fetch proxy that returns
    /// `{signedUrl, systemPrompt}`. Takes precedence over direct issuance.
    pub bootstrap_url: Option<String>,
    /// Interface language forced onto every connection.
    pub language: Language,
}

/// Shape of the optional `config.toml` overlay. All fields optional;
/// environment variables win over file values.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    agent_id: Option<String>,
    api_base: Option<String>,
    api_key: Option<String>,
    bootstrap_url: Option<String>,
    language: Option<String>,
}

impl ClientConfig {
    /// Builds the configuration from environment variables alone.
    ///
    /// Recognized variables: `VOKO_AGENT_ID` (required), `VOKO_API_KEY`,
    /// `VOKO_API_BASE`, `VOKO_BOOTSTRAP_URL`, `VOKO_LANGUAGE` (`de`/`en`).
    pub fn from_env() -> Result<Self> {
        Self::resolve(FileConfig::default(), process_env)
    }

    /// Builds the configuration from `config.toml` (if present) overlaid
    /// with environment variables.
    pub fn load(paths: &VokoPaths) -> Result<Self> {
        let file = match std::fs::read_to_string(paths.config_file()) {
            Ok(raw) => toml::from_str::<FileConfig>(&raw).map_err(|err| {
                VokoError::Serialization {
                    format: "TOML".to_string(),
                    message: format!("config.toml: {err}"),
                }
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(err) => return Err(VokoError::io(format!("Failed to read config.toml: {err}"))),
        };

        Self::resolve(file, process_env)
    }

    /// The lookup is injected so tests never depend on the host's real
    /// environment.
    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let agent_id = env("VOKO_AGENT_ID").or(file.agent_id).ok_or_else(|| {
            VokoError::config("VOKO_AGENT_ID is not set (env or config.toml [agent_id])")
        })?;

        let api_base = env("VOKO_API_BASE")
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let api_key = env("VOKO_API_KEY").or(file.api_key);
        let bootstrap_url = env("VOKO_BOOTSTRAP_URL").or(file.bootstrap_url);

        let language = match env("VOKO_LANGUAGE").or(file.language) {
            Some(raw) => parse_language(&raw)?,
            None => Language::default(),
        };

        Ok(Self {
            agent_id,
            api_base,
            api_key,
            bootstrap_url,
            language,
        })
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn parse_language(raw: &str) -> Result<Language> {
    match raw.to_ascii_lowercase().as_str() {
        "de" => Ok(Language::De),
        "en" => Ok(Language::En),
        other => Err(VokoError::config(format!(
            "Unsupported language {other:?} (expected \"de\" or \"en\")"
        ))),
    }
}
