//! Wire protocol of the conversational platform's WebSocket.
//!
//! Only the events the client actually consumes are modeled with full
//! payloads; everything else keeps an opaque body or is tolerated via the
//! `Unknown` fallback so a platform-side protocol addition never kills a
//! running session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::overrides::ConversationOverrides;

/// A tool invocation the agent expects the client to execute and answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub tool_call_id: String,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTranscriptEvent {
    pub user_transcript: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponseEvent {
    pub agent_response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingEvent {
    pub event_id: u64,
    #[serde(default)]
    pub ping_ms: Option<u64>,
}

/// Events delivered by the platform. Applied to the view model strictly in
/// delivery order; unrecognized event types decode to `Unknown` and are
/// skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ConversationInitiationMetadata {
        #[serde(default)]
        conversation_initiation_metadata_event: Option<Value>,
    },
    UserTranscript {
        user_transcription_event: UserTranscriptEvent,
    },
    AgentResponse {
        agent_response_event: AgentResponseEvent,
    },
    AgentResponseCorrection {
        #[serde(default)]
        agent_response_correction_event: Option<Value>,
    },
    /// Synthesized speech chunks; the core ignores the payload entirely.
    Audio {
        #[serde(default)]
        audio_event: Option<Value>,
    },
    Interruption {
        #[serde(default)]
        interruption_event: Option<Value>,
    },
    Ping {
        ping_event: PingEvent,
    },
    ClientToolCall {
        client_tool_call: ToolCall,
    },
    #[serde(other)]
    Unknown,
}

/// Events the client sends to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Opens the conversation, optionally overriding agent configuration
    /// (resume prompt, first message, language).
    ConversationInitiationClientData {
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation_config_override: Option<ConversationOverrides>,
    },
    /// Answer to a `Ping`.
    Pong { event_id: u64 },
    /// Synchronous acknowledgment of a tool call. The agent's turn stalls
    /// until this arrives.
    ClientToolResult {
        tool_call_id: String,
        result: String,
        is_error: bool,
    },
}
