//! Session bootstrap: signed-URL issuance and base-prompt fetch.
//!
//! Two modes, tried in this order by the controller:
//! 1. a credential-fetch proxy (`bootstrap_url`) returning
//!    `{signedUrl, systemPrompt}`,
//! 2. direct issuance against the platform with a server-held API key.
//!
//! Either failing is not fatal - the controller downgrades to the public
//! (unauthenticated) connection mode.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use voko_core::error::{Result, VokoError};
use voko_infrastructure::ClientConfig;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the controller needs to open an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBootstrap {
    pub signed_url: String,
    /// The agent's configured base prompt; empty when it could not be
    /// fetched. Used as the base for resume-prompt addenda.
    pub system_prompt: String,
}

/// Response shape of the credential-fetch proxy.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyResponse {
    signed_url: String,
    #[serde(default)]
    system_prompt: Option<String>,
}

/// Response shape of the platform's signed-URL endpoint.
#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    signed_url: String,
}

/// Fetches signed URLs either from a proxy or directly from the platform.
pub struct BootstrapClient {
    http: Client,
    agent_id: String,
    api_base: String,
    api_key: Option<String>,
    bootstrap_url: Option<String>,
}

impl BootstrapClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            agent_id: config.agent_id.clone(),
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            bootstrap_url: config.bootstrap_url.clone(),
        }
    }

    /// Fetches a signed URL plus the agent's base prompt.
    ///
    /// # Errors
    ///
    /// Returns a `Bootstrap` error when no mode is configured or the
    /// configured mode fails; callers fall back to the public connection.
    pub async fn fetch(&self) -> Result<SessionBootstrap> {
        if let Some(url) = &self.bootstrap_url {
            return self.fetch_via_proxy(url).await;
        }
        self.fetch_direct().await
    }

    async fn fetch_via_proxy(&self, url: &str) -> Result<SessionBootstrap> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| VokoError::bootstrap(format!("proxy request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(VokoError::bootstrap(format!(
                "proxy returned HTTP {}",
                response.status()
            )));
        }

        let body: ProxyResponse = response
            .json()
            .await
            .map_err(|err| VokoError::bootstrap(format!("invalid proxy response: {err}")))?;

        debug!("Bootstrapped session via proxy");
        Ok(SessionBootstrap {
            signed_url: body.signed_url,
            system_prompt: body.system_prompt.unwrap_or_default(),
        })
    }

    async fn fetch_direct(&self) -> Result<SessionBootstrap> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VokoError::bootstrap("no API key configured"))?;

        let signed_url = {
            let url = format!(
                "{}/v1/convai/conversation/get-signed-url?agent_id={}",
                self.api_base, self.agent_id
            );
            let response = self
                .http
                .get(&url)
                .header("xi-api-key", api_key)
                .send()
                .await
                .map_err(|err| VokoError::bootstrap(format!("signed-URL request failed: {err}")))?;

            if !response.status().is_success() {
                return Err(VokoError::bootstrap(format!(
                    "signed-URL endpoint returned HTTP {}",
                    response.status()
                )));
            }

            response
                .json::<SignedUrlResponse>()
                .await
                .map_err(|err| VokoError::bootstrap(format!("invalid signed-URL response: {err}")))?
                .signed_url
        };

        // The base prompt is nice-to-have; failing to fetch it only means
        // resume addenda are appended to an empty base.
        let system_prompt = self.fetch_agent_prompt(api_key).await.unwrap_or_default();

        Ok(SessionBootstrap {
            signed_url,
            system_prompt,
        })
    }

    async fn fetch_agent_prompt(&self, api_key: &str) -> Option<String> {
        let url = format!("{}/v1/convai/agents/{}", self.api_base, self.agent_id);
        let response = self
            .http
            .get(&url)
            .header("xi-api-key", api_key)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: Value = response.json().await.ok()?;
        body.pointer("/conversation_config/agent/prompt/prompt")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}
