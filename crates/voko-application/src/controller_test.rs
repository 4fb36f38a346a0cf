#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use voko_core::error::{Result, VokoError};
    use voko_core::persisted::{Language, PersistedState};
    use voko_core::repository::StateRepository;
    use voko_core::session::event::ConnectionStatus;
    use voko_core::session::model::Role;
    use voko_interaction::connection::AgentConnection;
    use voko_interaction::wire::{ClientEvent, PingEvent, ServerEvent, ToolCall};
    use voko_infrastructure::ClientConfig;

    use crate::controller::SessionController;

    // Scripted stand-in for the platform WebSocket.
    struct FakeConnection {
        inbound: VecDeque<ServerEvent>,
        sent: Arc<Mutex<Vec<ClientEvent>>>,
        closed: Arc<AtomicBool>,
        fail_sends: bool,
    }

    impl FakeConnection {
        fn scripted(events: Vec<ServerEvent>) -> (Self, Arc<Mutex<Vec<ClientEvent>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    inbound: events.into(),
                    sent: sent.clone(),
                    closed: Arc::new(AtomicBool::new(false)),
                    fail_sends: false,
                },
                sent,
            )
        }
    }

    #[async_trait]
    impl AgentConnection for FakeConnection {
        async fn send(&mut self, event: ClientEvent) -> Result<()> {
            if self.fail_sends {
                return Err(VokoError::connection("fake send failure"));
            }
            self.sent.lock().unwrap().push(event);
            Ok(())
        }

        async fn next_event(&mut self) -> Option<ServerEvent> {
            self.inbound.pop_front()
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        slot: Mutex<Option<PersistedState>>,
    }

    #[async_trait]
    impl StateRepository for MemoryStore {
        async fn load(&self) -> Result<Option<PersistedState>> {
            Ok(self.slot.lock().unwrap().clone())
        }

        async fn save(&self, state: &PersistedState) -> Result<()> {
            *self.slot.lock().unwrap() = Some(state.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            *self.slot.lock().unwrap() = None;
            Ok(())
        }
    }

    fn test_config() -> ClientConfig {
        ClientConfig {
            agent_id: "agent-test".to_string(),
            api_base: "https://example.invalid".to_string(),
            api_key: None,
            bootstrap_url: None,
            language: Language::En,
        }
    }

    fn controller() -> (SessionController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let controller = SessionController::new(test_config(), store.clone());
        (controller, store)
    }

    fn tool_call(name: &str, id: &str, parameters: serde_json::Value) -> ServerEvent {
        ServerEvent::ClientToolCall {
            client_tool_call: ToolCall {
                tool_name: name.to_string(),
                tool_call_id: id.to_string(),
                parameters,
            },
        }
    }

    fn user_says(text: &str) -> ServerEvent {
        ServerEvent::UserTranscript {
            user_transcription_event: voko_interaction::wire::UserTranscriptEvent {
                user_transcript: text.to_string(),
            },
        }
    }

    fn coach_says(text: &str) -> ServerEvent {
        ServerEvent::AgentResponse {
            agent_response_event: voko_interaction::wire::AgentResponseEvent {
                agent_response: text.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn initiation_carries_fresh_user_overrides() {
        let (mut controller, _) = controller();
        let (connection, sent) = FakeConnection::scripted(vec![]);

        controller
            .start_with_connection(Box::new(connection), "BASE")
            .await
            .unwrap();

        assert_eq!(controller.status(), ConnectionStatus::Connected);

        let sent = sent.lock().unwrap();
        match &sent[0] {
            ClientEvent::ConversationInitiationClientData {
                conversation_config_override: Some(overrides),
            } => {
                assert_eq!(overrides.agent.language, "en");
                assert!(overrides.agent.prompt.is_none());
                assert!(overrides.agent.first_message.is_none());
            }
            other => panic!("unexpected first event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn tool_calls_update_the_draft_and_are_acknowledged() {
        let (mut controller, _) = controller();
        let (connection, sent) = FakeConnection::scripted(vec![
            tool_call(
                "update_todos",
                "call-1",
                json!({
                    "todos": [{"text": "Find the customer"}],
                    "understanding": "runs a support team"
                }),
            ),
            tool_call(
                "update_workspace",
                "call-2",
                json!({
                    "impact": {"strategy": "Grow retention", "kpis": ["NPS"]},
                    "outcome": {"objective": "Obj", "key_results": []}
                }),
            ),
        ]);

        controller
            .start_with_connection(Box::new(connection), "")
            .await
            .unwrap();
        controller.run().await.unwrap();

        let draft = &controller.state().current_session;
        assert_eq!(draft.todos.len(), 1);
        assert_eq!(draft.todos[0].id, "step-1");
        assert_eq!(draft.impact.strategy.as_deref(), Some("Grow retention"));
        assert_eq!(draft.outcome.as_ref().unwrap().objective, "Obj");
        assert_eq!(draft.understanding, "runs a support team");
        assert_eq!(controller.state().user_context, "runs a support team");

        let sent = sent.lock().unwrap();
        let acks: Vec<_> = sent
            .iter()
            .filter_map(|event| match event {
                ClientEvent::ClientToolResult {
                    tool_call_id,
                    result,
                    is_error,
                } => Some((tool_call_id.as_str(), result.as_str(), *is_error)),
                _ => None,
            })
            .collect();
        assert_eq!(acks, vec![("call-1", "ok", false), ("call-2", "ok", false)]);

        assert_eq!(controller.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn unknown_tools_get_an_error_result_but_the_session_continues() {
        let (mut controller, _) = controller();
        let (connection, sent) = FakeConnection::scripted(vec![
            tool_call("refresh_dashboard", "call-1", json!({})),
            tool_call("update_todos", "call-2", json!({"todos": [{"text": "A"}]})),
        ]);

        controller
            .start_with_connection(Box::new(connection), "")
            .await
            .unwrap();
        controller.run().await.unwrap();

        let sent = sent.lock().unwrap();
        let first_ack = sent
            .iter()
            .find_map(|event| match event {
                ClientEvent::ClientToolResult {
                    result, is_error, ..
                } => Some((result.clone(), *is_error)),
                _ => None,
            })
            .unwrap();
        assert!(first_ack.1);
        assert!(first_ack.0.contains("refresh_dashboard"));

        // The follow-up call still landed.
        assert_eq!(controller.state().current_session.todos.len(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_degrades_to_defaults_and_still_acks_ok() {
        let (mut controller, _) = controller();
        let (connection, sent) = FakeConnection::scripted(vec![tool_call(
            "update_todos",
            "call-1",
            json!("complete garbage"),
        )]);

        controller
            .start_with_connection(Box::new(connection), "")
            .await
            .unwrap();
        controller.run().await.unwrap();

        assert!(controller.state().current_session.todos.is_empty());

        let sent = sent.lock().unwrap();
        assert!(sent.iter().any(|event| matches!(
            event,
            ClientEvent::ClientToolResult { result, is_error, .. }
                if result == "ok" && !is_error
        )));
    }

    #[tokio::test]
    async fn transcript_is_recorded_in_delivery_order() {
        let (mut controller, _) = controller();
        let (connection, _) = FakeConnection::scripted(vec![
            coach_says("What team do you work in?"),
            user_says("Customer support"),
        ]);

        controller
            .start_with_connection(Box::new(connection), "")
            .await
            .unwrap();
        controller.run().await.unwrap();

        let messages = controller.state().current_session.messages.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::Coach);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].text, "Customer support");
    }

    #[tokio::test]
    async fn pings_are_answered_with_pongs() {
        let (mut controller, _) = controller();
        let (connection, sent) = FakeConnection::scripted(vec![ServerEvent::Ping {
            ping_event: PingEvent {
                event_id: 42,
                ping_ms: Some(20),
            },
        }]);

        controller
            .start_with_connection(Box::new(connection), "")
            .await
            .unwrap();
        controller.run().await.unwrap();

        let sent = sent.lock().unwrap();
        assert!(
            sent.iter()
                .any(|event| matches!(event, ClientEvent::Pong { event_id: 42 }))
        );
    }

    #[tokio::test]
    async fn send_failure_surfaces_error_status_and_keeps_the_draft() {
        let (mut controller, _) = controller();
        let (good, _) = FakeConnection::scripted(vec![]);
        controller
            .start_with_connection(Box::new(good), "")
            .await
            .unwrap();

        // Swap in a transport that fails every outbound send; the next
        // ping answer tears the session down.
        let (mut poisoned, _) = FakeConnection::scripted(vec![
            user_says("still here"),
            ServerEvent::Ping {
                ping_event: PingEvent {
                    event_id: 1,
                    ping_ms: None,
                },
            },
        ]);
        poisoned.fail_sends = true;
        *controller.connection_mut() = Some(Box::new(poisoned));

        controller.run().await.unwrap();

        assert_eq!(controller.status(), ConnectionStatus::Error);
        // The transcript recorded before the failure survives.
        assert_eq!(controller.state().current_session.messages.len(), 1);
    }

    #[tokio::test]
    async fn end_session_closes_the_transport_optimistically() {
        let (mut controller, _) = controller();
        let (connection, _) = FakeConnection::scripted(vec![]);
        let closed = connection.closed.clone();

        controller
            .start_with_connection(Box::new(connection), "")
            .await
            .unwrap();
        controller.end_session().await;

        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(controller.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn start_new_okr_archives_and_persists() {
        let (mut controller, store) = controller();
        let (connection, _) = FakeConnection::scripted(vec![tool_call(
            "update_workspace",
            "call-1",
            json!({"outcome": {"objective": "Ship onboarding", "key_results": []}}),
        )]);

        controller
            .start_with_connection(Box::new(connection), "")
            .await
            .unwrap();
        controller.run().await.unwrap();

        let archived = controller.start_new_okr().await;
        assert!(archived.is_some());
        assert!(controller.state().current_session.outcome.is_none());
        assert_eq!(controller.state().completed_sessions.len(), 1);

        // The archive is flushed to storage immediately.
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.completed_sessions.len(), 1);
        assert_eq!(
            stored.completed_sessions[0].okr.objective,
            "Ship onboarding"
        );
    }

    #[tokio::test]
    async fn reset_clears_state_and_storage() {
        let (mut controller, store) = controller();
        store
            .save(&{
                let mut state = PersistedState::new_default(Language::En);
                state.user_context = "old context".to_string();
                state
            })
            .await
            .unwrap();

        controller.hydrate().await;
        assert_eq!(controller.state().user_context, "old context");

        controller.reset_all().await;

        assert_eq!(controller.state().user_context, "");
        assert!(controller.state().completed_sessions.is_empty());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_the_pending_debounced_write() {
        let (mut controller, store) = controller();

        // A mutation inside the quiet period schedules a delayed write of
        // the pre-reset state.
        controller.set_language(Language::De).await;
        tokio::task::yield_now().await;

        controller.reset_all().await;

        // The cleared slot must stay clear even after the quiet period
        // would have elapsed.
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(store.load().await.unwrap().is_none());

        // And the shutdown flush must not replay the discarded snapshot.
        controller.end_session().await;
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn hydrate_falls_back_to_default_on_store_failure() {
        struct FailingStore;

        #[async_trait]
        impl StateRepository for FailingStore {
            async fn load(&self) -> Result<Option<PersistedState>> {
                Err(VokoError::storage("disk on fire"))
            }
            async fn save(&self, _state: &PersistedState) -> Result<()> {
                Ok(())
            }
            async fn clear(&self) -> Result<()> {
                Ok(())
            }
        }

        let mut controller = SessionController::new(test_config(), Arc::new(FailingStore));
        controller.hydrate().await;

        assert!(controller.state().completed_sessions.is_empty());
        assert_eq!(controller.status(), ConnectionStatus::Idle);
    }
}
