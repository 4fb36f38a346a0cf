//! Live WebSocket connection to the conversational platform.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use voko_core::error::{Result, VokoError};

use crate::wire::{ClientEvent, ServerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The remote-agent transport seam.
///
/// The production implementation is a WebSocket; tests drive the controller
/// with scripted fakes.
#[async_trait]
pub trait AgentConnection: Send {
    /// Sends one client event.
    async fn send(&mut self, event: ClientEvent) -> Result<()>;

    /// Waits for the next decodable server event. `None` means the
    /// connection ended (close frame, drop, or transport error).
    async fn next_event(&mut self) -> Option<ServerEvent>;

    /// Issues a close request. Completion of the close handshake is not
    /// awaited beyond the protocol's own acknowledgment.
    async fn close(&mut self) -> Result<()>;
}

/// WebSocket-backed [`AgentConnection`].
pub struct WsConnection {
    stream: WsStream,
}

impl WsConnection {
    /// Connects to a signed (authenticated) conversation URL.
    pub async fn connect_signed(signed_url: &str) -> Result<Self> {
        let (stream, response) = connect_async(signed_url)
            .await
            .map_err(|err| VokoError::connection(format!("WebSocket connect failed: {err}")))?;
        debug!("Connected (HTTP {})", response.status());
        Ok(Self { stream })
    }

    /// Connects in public mode, addressing the agent by id without
    /// credentials. Used when the bootstrap step fails.
    pub async fn connect_public(api_base: &str, agent_id: &str) -> Result<Self> {
        let ws_base = api_base
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        let url = format!("{ws_base}/v1/convai/conversation?agent_id={agent_id}");
        Self::connect_signed(&url).await
    }
}

#[async_trait]
impl AgentConnection for WsConnection {
    async fn send(&mut self, event: ClientEvent) -> Result<()> {
        let json = serde_json::to_string(&event)?;
        self.stream
            .send(Message::Text(json))
            .await
            .map_err(|err| VokoError::connection(format!("WebSocket send failed: {err}")))
    }

    async fn next_event(&mut self) -> Option<ServerEvent> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => return Some(event),
                    Err(err) => {
                        // A malformed frame is skipped, not fatal.
                        warn!("Dropping undecodable frame: {err}");
                    }
                },
                Ok(Message::Close(frame)) => {
                    debug!("Server closed the connection: {frame:?}");
                    return None;
                }
                // Binary/ping/pong frames carry nothing for the core.
                Ok(_) => {}
                Err(err) => {
                    warn!("WebSocket read error: {err}");
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|err| VokoError::connection(format!("WebSocket close failed: {err}")))
    }
}
