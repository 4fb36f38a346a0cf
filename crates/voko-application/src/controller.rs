//! Session controller: orchestrates the session lifecycle.
//!
//! Connects to the remote agent, chooses the resume strategy, routes
//! inbound tool calls through the normalization layer into the view model,
//! records the transcript, and schedules debounced persistence. The
//! controller is the view model's only writer; everything runs on the
//! caller's single task, so no lock discipline is needed around the state.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use voko_core::error::{Result, VokoError};
use voko_core::normalize::{parse_todo_update, parse_workspace_update};
use voko_core::persisted::{Language, PersistedState};
use voko_core::repository::StateRepository;
use voko_core::resume::select_scenario;
use voko_core::session::event::{ConnectionStatus, UiEvent};
use voko_core::session::model::Role;
use voko_infrastructure::{ClientConfig, DebouncedSaver};
use voko_interaction::bootstrap::BootstrapClient;
use voko_interaction::connection::{AgentConnection, WsConnection};
use voko_interaction::overrides::build_overrides;
use voko_interaction::wire::{ClientEvent, ServerEvent, ToolCall};

/// Capacity of the UI event channel; slow subscribers lag, they never
/// block the controller.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Orchestrates one coaching session end to end.
pub struct SessionController {
    config: ClientConfig,
    store: Arc<dyn StateRepository>,
    saver: DebouncedSaver,
    state: PersistedState,
    status: ConnectionStatus,
    events: broadcast::Sender<UiEvent>,
    connection: Option<Box<dyn AgentConnection>>,
}

impl SessionController {
    /// Creates a controller with a fresh default state. Call
    /// [`hydrate`](Self::hydrate) to pick up a previously persisted state.
    pub fn new(config: ClientConfig, store: Arc<dyn StateRepository>) -> Self {
        let saver = DebouncedSaver::with_default_period(Arc::clone(&store));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = PersistedState::new_default(config.language);

        Self {
            config,
            store,
            saver,
            state,
            status: ConnectionStatus::Idle,
            events,
            connection: None,
        }
    }

    /// Rehydrates the view model from the persistence store.
    ///
    /// Any unusable saved state (absent, corrupt, version mismatch, or a
    /// failing read) falls back to the default - persistence is never a
    /// hard dependency.
    pub async fn hydrate(&mut self) {
        match self.store.load().await {
            Ok(Some(saved)) => {
                info!(
                    "Restored session state ({} archived sessions)",
                    saved.completed_sessions.len()
                );
                self.state = saved;
            }
            Ok(None) => {}
            Err(err) => {
                warn!("Failed to read saved state, starting fresh: {err}");
            }
        }
    }

    /// Subscribes to UI-facing events.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn language(&self) -> Language {
        self.state.language
    }

    /// Changes the interface language, effective from the next connection.
    pub async fn set_language(&mut self, language: Language) {
        self.state.language = language;
        self.schedule_save().await;
    }

    /// Opens a session with the remote agent.
    ///
    /// Bootstrap failure downgrades to the public connection mode; if that
    /// also fails, the error status is surfaced and the view model is left
    /// untouched (no partial session).
    pub async fn start_session(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        self.set_status(ConnectionStatus::Connecting);

        let result = self.open_connection().await;
        let (connection, base_prompt) = match result {
            Ok(pair) => pair,
            Err(err) => {
                self.set_status(ConnectionStatus::Error);
                return Err(err);
            }
        };

        if let Err(err) = self.start_with_connection(connection, &base_prompt).await {
            self.set_status(ConnectionStatus::Error);
            return Err(err);
        }
        Ok(())
    }

    /// Performs the pre-handshake steps on an already-open transport:
    /// resume-scenario selection, override construction, and the initiation
    /// event. Split out so embedders and tests can supply their own
    /// [`AgentConnection`].
    pub async fn start_with_connection(
        &mut self,
        mut connection: Box<dyn AgentConnection>,
        base_prompt: &str,
    ) -> Result<()> {
        let scenario = select_scenario(&self.state);
        info!("Starting session with scenario {scenario:?}");

        let overrides = build_overrides(scenario, &self.state, base_prompt)?;
        connection
            .send(ClientEvent::ConversationInitiationClientData {
                conversation_config_override: Some(overrides),
            })
            .await?;

        self.connection = Some(connection);
        self.set_status(ConnectionStatus::Connected);
        Ok(())
    }

    async fn open_connection(&self) -> Result<(Box<dyn AgentConnection>, String)> {
        let bootstrap = BootstrapClient::new(&self.config);
        match bootstrap.fetch().await {
            Ok(session) => match WsConnection::connect_signed(&session.signed_url).await {
                Ok(connection) => {
                    return Ok((Box::new(connection), session.system_prompt));
                }
                Err(err) => {
                    warn!("Signed connection failed, trying public mode: {err}");
                }
            },
            Err(err) => {
                warn!("Bootstrap failed, trying public mode: {err}");
            }
        }

        let connection =
            WsConnection::connect_public(&self.config.api_base, &self.config.agent_id).await?;
        Ok((Box::new(connection), String::new()))
    }

    /// Drives the session until the connection ends. Returns after the
    /// status transitioned to `Disconnected` (orderly end) or `Error`
    /// (transport failure); the view model retains its last-known values
    /// either way so the user can resume.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let event = match self.connection.as_mut() {
                Some(connection) => connection.next_event().await,
                None => break,
            };

            let Some(event) = event else { break };

            if let Err(err) = self.handle_server_event(event).await {
                if err.is_connection() {
                    warn!("Session ended on connection error: {err}");
                    self.connection = None;
                    self.set_status(ConnectionStatus::Error);
                    self.saver.flush().await;
                    return Ok(());
                }
                return Err(err);
            }
        }

        self.connection = None;
        self.set_status(ConnectionStatus::Disconnected);
        self.saver.flush().await;
        Ok(())
    }

    /// Ends the session: issues a close request and transitions to
    /// inactive optimistically, without waiting on the close handshake.
    pub async fn end_session(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(err) = connection.close().await {
                warn!("Close request failed: {err}");
            }
        }
        self.set_status(ConnectionStatus::Disconnected);
        self.saver.flush().await;
    }

    /// "Start new OKR": archives the current draft into the history and
    /// resets the session, preserving the accumulated user context.
    ///
    /// Returns the archived session id, or `None` when there was no OKR
    /// draft to archive.
    pub async fn start_new_okr(&mut self) -> Option<String> {
        let archived = self.state.archive_current()?;
        info!("Archived session {archived}");

        self.emit(UiEvent::WorkspaceUpdated {
            draft: self.state.current_session.clone(),
        });
        self.persist_now().await;
        Some(archived)
    }

    /// Factory reset: clears the draft, the history, the user context and
    /// the storage slot. Distinct from archival.
    pub async fn reset_all(&mut self) {
        // Drop any pending debounced write first, or a mutation scheduled
        // moments before the reset would repopulate the cleared slot.
        self.saver.discard().await;
        if let Err(err) = self.store.clear().await {
            warn!("Failed to clear storage slot: {err}");
        }
        self.state.reset_all();
        self.emit(UiEvent::WorkspaceUpdated {
            draft: self.state.current_session.clone(),
        });
    }

    async fn handle_server_event(&mut self, event: ServerEvent) -> Result<()> {
        match event {
            ServerEvent::UserTranscript {
                user_transcription_event,
            } => {
                self.record(Role::User, user_transcription_event.user_transcript)
                    .await;
                self.set_status(ConnectionStatus::Listening);
            }
            ServerEvent::AgentResponse {
                agent_response_event,
            } => {
                self.record(Role::Coach, agent_response_event.agent_response)
                    .await;
                self.set_status(ConnectionStatus::Speaking);
            }
            ServerEvent::Audio { .. } => {
                if self.status != ConnectionStatus::Speaking {
                    self.set_status(ConnectionStatus::Speaking);
                }
            }
            ServerEvent::Interruption { .. } => {
                self.set_status(ConnectionStatus::Listening);
            }
            ServerEvent::Ping { ping_event } => {
                self.send_event(ClientEvent::Pong {
                    event_id: ping_event.event_id,
                })
                .await?;
            }
            ServerEvent::ClientToolCall { client_tool_call } => {
                self.handle_tool_call(client_tool_call).await?;
            }
            ServerEvent::ConversationInitiationMetadata { .. }
            | ServerEvent::AgentResponseCorrection { .. }
            | ServerEvent::Unknown => {}
        }
        Ok(())
    }

    /// Executes one tool call and acknowledges it. A malformed payload
    /// degrades to defaults inside normalization and still acks "ok"; only
    /// an unknown tool name is answered with an error result. Either way
    /// the session continues.
    async fn handle_tool_call(&mut self, call: ToolCall) -> Result<()> {
        let (result, is_error) = match call.tool_name.as_str() {
            "update_todos" => {
                let update = parse_todo_update(call.parameters);
                if let Some(understanding) = &update.understanding {
                    self.state.accumulate_understanding(understanding);
                }

                let newly_completed = self.state.current_session.apply_todos(update);
                self.emit(UiEvent::TodosUpdated {
                    todos: self.state.current_session.todos.clone(),
                    newly_completed: newly_completed.into_iter().collect(),
                });
                ("ok".to_string(), false)
            }
            "update_workspace" => {
                let update = parse_workspace_update(call.parameters);
                if update.is_empty() {
                    warn!(
                        "update_workspace carried no recognized fields ({})",
                        call.tool_call_id
                    );
                }
                if let Some(understanding) = &update.understanding {
                    self.state.accumulate_understanding(understanding);
                }

                self.state.current_session.apply_workspace(update);
                self.emit(UiEvent::WorkspaceUpdated {
                    draft: self.state.current_session.clone(),
                });
                ("ok".to_string(), false)
            }
            other => {
                warn!("Unhandled client tool: {other} ({})", call.tool_call_id);
                (format!("unknown tool: {other}"), true)
            }
        };

        self.schedule_save().await;
        self.send_event(ClientEvent::ClientToolResult {
            tool_call_id: call.tool_call_id,
            result,
            is_error,
        })
        .await
    }

    /// Transcript recorder: appends a timestamped, role-tagged line and
    /// publishes it.
    async fn record(&mut self, role: Role, text: String) {
        let message = self
            .state
            .current_session
            .messages
            .append(role, text)
            .clone();
        self.emit(UiEvent::TranscriptAppended { message });
        self.schedule_save().await;
    }

    async fn send_event(&mut self, event: ClientEvent) -> Result<()> {
        match self.connection.as_mut() {
            Some(connection) => connection.send(event).await,
            None => Err(VokoError::connection("no active connection")),
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            self.status = status;
            self.emit(UiEvent::StatusChanged { status });
        }
    }

    #[cfg(test)]
    pub(crate) fn connection_mut(&mut self) -> &mut Option<Box<dyn AgentConnection>> {
        &mut self.connection
    }

    fn emit(&self, event: UiEvent) {
        // A send error only means nobody is subscribed right now.
        let _ = self.events.send(event);
    }

    async fn schedule_save(&mut self) {
        self.saver.schedule(self.state.clone()).await;
    }

    async fn persist_now(&mut self) {
        self.saver.schedule(self.state.clone()).await;
        self.saver.flush().await;
    }
}
