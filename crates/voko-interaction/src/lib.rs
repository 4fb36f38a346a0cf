//! Voko interaction: the boundary with the hosted conversational platform.
//!
//! Contains the WebSocket wire protocol, the signed-URL bootstrap client,
//! the live connection, and the scenario-specific conversation overrides.

pub mod bootstrap;
pub mod connection;
pub mod overrides;
pub mod wire;

pub use bootstrap::{BootstrapClient, SessionBootstrap};
pub use connection::{AgentConnection, WsConnection};
pub use overrides::{AgentOverrides, ConversationOverrides, PromptOverride, build_overrides};
pub use wire::{ClientEvent, ServerEvent, ToolCall};
