//! Integration tests for the lifecycle controller
//!
//! These tests drive controllers through a scripted transport and verify:
//! - Success and failure paths of start and stop
//! - The in-flight guard against re-entrant transitions
//! - Deadlines on unresponsive backends
//! - Independence of controllers for different services

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Reply, ScriptedTransport};
use deck_control::{
    ControlError, ControllerConfig, LifecycleController, Notice, SerialParams, ServiceConfig,
    ServiceStatus, TransitionOutcome, WebsocketParams,
};
use deck_gateway::{commands, ServiceId};
use proptest::prelude::*;
use serde_json::json;
use tokio::sync::mpsc;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub fn com3() -> SerialParams {
        SerialParams {
            port_name: "COM3".to_string(),
            baud_rate: 9600,
        }
    }

    pub fn serial(transport: &Arc<ScriptedTransport>) -> LifecycleController<SerialParams> {
        LifecycleController::new(
            ServiceConfig::serial(),
            transport.gateway(),
            &ControllerConfig::default(),
        )
    }

    pub fn websocket(transport: &Arc<ScriptedTransport>) -> LifecycleController<WebsocketParams> {
        LifecycleController::new(
            ServiceConfig::websocket(),
            transport.gateway(),
            &ControllerConfig::default(),
        )
    }

    /// A serial controller that is already running
    pub async fn running_serial(
        transport: &Arc<ScriptedTransport>,
    ) -> LifecycleController<SerialParams> {
        transport.script(commands::START_SERIAL_SERVER, Reply::Ok(json!(true)));
        let controller = serial(transport);
        assert!(controller.start(&com3()).await.is_completed());
        controller
    }
}

// ============================================================================
// Start / Stop Tests
// ============================================================================

mod transition_tests {
    use super::*;

    #[tokio::test]
    async fn start_success_reaches_running() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_SERIAL_SERVER, Reply::Ok(json!(true)));
        let controller = helpers::serial(&transport);

        let outcome = controller.start(&helpers::com3()).await;

        assert_eq!(outcome, TransitionOutcome::Completed(ServiceStatus::Running));
        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Running);
        assert_eq!(state.last_error, None);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "start_serial_server");
        assert_eq!(calls[0].1.get_str("portName"), Some("COM3"));
        assert_eq!(calls[0].1.get_i64("baudRate"), Some(9600));
    }

    #[tokio::test]
    async fn falsy_start_reports_generic_failure() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_SERIAL_SERVER, Reply::Ok(json!(false)));
        let controller = helpers::serial(&transport);

        let outcome = controller.start(&helpers::com3()).await;

        assert_eq!(
            outcome,
            TransitionOutcome::Failed("failed to start service".to_string())
        );
        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Stopped);
        assert_eq!(state.last_error.as_deref(), Some("failed to start service"));
    }

    #[tokio::test]
    async fn rejected_start_records_normalized_reason() {
        let transport = ScriptedTransport::new();
        transport.script(
            commands::START_SERIAL_SERVER,
            Reply::Err(json!({"kind": "open_failed", "message": "port COM3 is busy"})),
        );
        let controller = helpers::serial(&transport);

        controller.start(&helpers::com3()).await;

        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Stopped);
        assert_eq!(state.last_error.as_deref(), Some("port COM3 is busy"));
    }

    #[tokio::test]
    async fn structured_failure_message_is_used() {
        let transport = ScriptedTransport::new();
        transport.script(
            commands::START_WS_SERVER,
            Reply::Ok(json!({"success": false, "message": "address in use"})),
        );
        let controller = helpers::websocket(&transport);

        let outcome = controller.start(&WebsocketParams { port: 9898 }).await;

        assert_eq!(outcome, TransitionOutcome::Failed("address in use".to_string()));
    }

    #[tokio::test]
    async fn retry_after_failure_clears_error() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_SERIAL_SERVER, Reply::Err(json!("port busy")));
        transport.script(commands::START_SERIAL_SERVER, Reply::Ok(json!(true)));
        let controller = helpers::serial(&transport);

        controller.start(&helpers::com3()).await;
        assert!(controller.current_state().last_error.is_some());

        controller.start(&helpers::com3()).await;
        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Running);
        assert_eq!(state.last_error, None);
        assert_eq!(transport.count(commands::START_SERIAL_SERVER), 2);
    }

    #[tokio::test]
    async fn start_then_stop_round_trip() {
        let transport = ScriptedTransport::new();
        let controller = helpers::running_serial(&transport).await;
        transport.script(commands::STOP_SERIAL_SERVER, Reply::Ok(json!(true)));

        let outcome = controller.stop().await;

        assert_eq!(outcome, TransitionOutcome::Completed(ServiceStatus::Stopped));
        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Stopped);
        assert_eq!(state.last_error, None);

        let calls = transport.calls();
        let stop_call = &calls[1];
        assert_eq!(stop_call.0, "stop_serial_server");
        assert!(stop_call.1.is_empty());
    }

    #[tokio::test]
    async fn stop_failure_reverts_to_running() {
        let transport = ScriptedTransport::new();
        let controller = helpers::running_serial(&transport).await;
        transport.script(commands::STOP_SERIAL_SERVER, Reply::Ok(json!(false)));

        let outcome = controller.stop().await;

        assert_eq!(
            outcome,
            TransitionOutcome::Failed("failed to stop service".to_string())
        );
        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Running);
        assert_eq!(state.last_error.as_deref(), Some("failed to stop service"));
    }

    #[tokio::test]
    async fn stop_while_stopped_is_refused_without_command() {
        let transport = ScriptedTransport::new();
        let controller = helpers::serial(&transport);

        let outcome = controller.stop().await;

        assert_eq!(
            outcome,
            TransitionOutcome::Rejected(ControlError::NotRunning(ServiceId::SERIAL))
        );
        assert!(transport.calls().is_empty());
        assert_eq!(controller.current_state().status, ServiceStatus::Stopped);
    }

    #[tokio::test]
    async fn start_while_running_is_refused_without_command() {
        let transport = ScriptedTransport::new();
        let controller = helpers::running_serial(&transport).await;

        let outcome = controller.start(&helpers::com3()).await;

        assert_eq!(
            outcome,
            TransitionOutcome::Rejected(ControlError::AlreadyRunning(ServiceId::SERIAL))
        );
        assert_eq!(transport.count(commands::START_SERIAL_SERVER), 1);
    }

    #[tokio::test]
    async fn notices_follow_outcomes() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_WS_SERVER, Reply::Ok(json!(true)));
        transport.script(commands::STOP_WS_SERVER, Reply::Err(json!("not running")));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = helpers::websocket(&transport).with_notices(tx);

        controller.start(&WebsocketParams { port: 9898 }).await;
        controller.stop().await;

        assert_eq!(rx.try_recv().unwrap(), Notice::Started(ServiceId::WEBSOCKET));
        assert_eq!(
            rx.try_recv().unwrap(),
            Notice::TransitionFailed {
                service: ServiceId::WEBSOCKET,
                action: "stop",
                message: "not running".to_string(),
            }
        );
        assert!(rx.try_recv().is_err());
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test]
    async fn start_in_flight_blocks_second_start() {
        let transport = ScriptedTransport::new();
        transport.gate(commands::START_SERIAL_SERVER);
        transport.script(commands::START_SERIAL_SERVER, Reply::Ok(json!(true)));
        let controller = Arc::new(helpers::serial(&transport));

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.start(&helpers::com3()).await }
        });
        transport.wait_for_calls(1).await;
        assert_eq!(controller.current_state().status, ServiceStatus::Starting);
        assert!(controller.current_state().is_busy());

        let second = controller.start(&helpers::com3()).await;
        assert_eq!(
            second,
            TransitionOutcome::Rejected(ControlError::Busy {
                service: ServiceId::SERIAL,
                status: ServiceStatus::Starting,
            })
        );
        let stop = controller.stop().await;
        assert!(matches!(stop, TransitionOutcome::Rejected(ControlError::Busy { .. })));

        transport.release(commands::START_SERIAL_SERVER);
        let first = first.await.unwrap();

        assert!(first.is_completed());
        assert_eq!(transport.count(commands::START_SERIAL_SERVER), 1);
        assert_eq!(transport.count(commands::STOP_SERIAL_SERVER), 0);
        assert_eq!(controller.current_state().status, ServiceStatus::Running);
    }

    #[tokio::test]
    async fn stop_in_flight_blocks_second_stop() {
        let transport = ScriptedTransport::new();
        let controller = Arc::new(helpers::running_serial(&transport).await);
        transport.gate(commands::STOP_SERIAL_SERVER);
        transport.script(commands::STOP_SERIAL_SERVER, Reply::Ok(json!(true)));

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.stop().await }
        });
        transport.wait_for_calls(2).await;
        assert_eq!(controller.current_state().status, ServiceStatus::Stopping);

        assert!(matches!(
            controller.stop().await,
            TransitionOutcome::Rejected(ControlError::Busy { .. })
        ));

        transport.release(commands::STOP_SERIAL_SERVER);
        assert!(first.await.unwrap().is_completed());
        assert_eq!(transport.count(commands::STOP_SERIAL_SERVER), 1);
    }

    #[tokio::test]
    async fn controllers_for_different_services_are_independent() {
        let transport = ScriptedTransport::new();
        transport.gate(commands::START_SERIAL_SERVER);
        transport.gate(commands::START_WS_SERVER);
        transport.script(commands::START_SERIAL_SERVER, Reply::Ok(json!(true)));
        transport.script(commands::START_WS_SERVER, Reply::Err(json!("address in use")));
        let serial = Arc::new(helpers::serial(&transport));
        let websocket = Arc::new(helpers::websocket(&transport));

        let serial_task = tokio::spawn({
            let serial = Arc::clone(&serial);
            async move { serial.start(&helpers::com3()).await }
        });
        let ws_task = tokio::spawn({
            let websocket = Arc::clone(&websocket);
            async move { websocket.start(&WebsocketParams { port: 9898 }).await }
        });
        transport.wait_for_calls(2).await;
        assert_eq!(serial.status(), ServiceStatus::Starting);
        assert_eq!(websocket.status(), ServiceStatus::Starting);

        // Resolve in the opposite order they were issued
        transport.release(commands::START_WS_SERVER);
        let ws_outcome = ws_task.await.unwrap();
        assert_eq!(ws_outcome, TransitionOutcome::Failed("address in use".to_string()));
        assert_eq!(serial.status(), ServiceStatus::Starting);

        transport.release(commands::START_SERIAL_SERVER);
        assert!(serial_task.await.unwrap().is_completed());

        assert_eq!(serial.current_state().status, ServiceStatus::Running);
        assert_eq!(serial.current_state().last_error, None);
        assert_eq!(websocket.current_state().status, ServiceStatus::Stopped);
        assert_eq!(
            websocket.current_state().last_error.as_deref(),
            Some("address in use")
        );
    }

    #[tokio::test]
    async fn observers_see_transitional_status() {
        let transport = ScriptedTransport::new();
        transport.gate(commands::START_WS_SERVER);
        transport.script(commands::START_WS_SERVER, Reply::Ok(json!(true)));
        let controller = Arc::new(helpers::websocket(&transport));
        let mut rx = controller.subscribe();

        let task = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.start(&WebsocketParams { port: 9898 }).await }
        });

        rx.wait_for(|s| s.status == ServiceStatus::Starting)
            .await
            .unwrap();
        transport.wait_for_calls(1).await;
        transport.release(commands::START_WS_SERVER);
        rx.wait_for(|s| s.status == ServiceStatus::Running)
            .await
            .unwrap();
        task.await.unwrap();
    }
}

// ============================================================================
// Deadline Tests
// ============================================================================

mod deadline_tests {
    use super::*;

    #[tokio::test]
    async fn unresponsive_start_times_out_and_reverts() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_SERIAL_SERVER, Reply::Hang);
        let controller = LifecycleController::new(
            ServiceConfig::serial(),
            transport.gateway(),
            &ControllerConfig::with_timeout(Duration::from_millis(30)),
        );

        let outcome = controller.start(&helpers::com3()).await;

        assert_eq!(
            outcome,
            TransitionOutcome::Failed("start_serial_server timed out after 30ms".to_string())
        );
        assert_eq!(controller.current_state().status, ServiceStatus::Stopped);
    }

    #[tokio::test]
    async fn unresponsive_stop_times_out_and_reverts() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_WS_SERVER, Reply::Ok(json!(true)));
        transport.script(commands::STOP_WS_SERVER, Reply::Hang);
        let controller = LifecycleController::new(
            ServiceConfig::websocket(),
            transport.gateway(),
            &ControllerConfig::with_timeout(Duration::from_millis(30)),
        );
        controller.start(&WebsocketParams { port: 9898 }).await;

        controller.stop().await;

        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Running);
        assert!(state.last_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn unbounded_controller_stays_in_flight() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_SERIAL_SERVER, Reply::Hang);
        let controller = Arc::new(LifecycleController::new(
            ServiceConfig::serial(),
            transport.gateway(),
            &ControllerConfig::unbounded(),
        ));

        let task = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.start(&helpers::com3()).await }
        });
        transport.wait_for_calls(1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(controller.status(), ServiceStatus::Starting);
        task.abort();
    }

    #[tokio::test]
    async fn abandoned_start_reverts_and_allows_retry() {
        let transport = ScriptedTransport::new();
        transport.script(commands::START_SERIAL_SERVER, Reply::Hang);
        transport.script(commands::START_SERIAL_SERVER, Reply::Ok(json!(true)));
        let controller = LifecycleController::new(
            ServiceConfig::serial(),
            transport.gateway(),
            &ControllerConfig::with_timeout(Duration::from_millis(50)),
        );

        // The caller gives up before the controller's own deadline
        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), controller.start(&helpers::com3()))
                .await;
        assert!(abandoned.is_err());

        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Stopped);
        assert_eq!(
            state.last_error.as_deref(),
            Some("start_serial_server cancelled")
        );

        let retry = controller.start(&helpers::com3()).await;
        assert_eq!(retry, TransitionOutcome::Completed(ServiceStatus::Running));
        assert_eq!(controller.current_state().last_error, None);
    }

    #[tokio::test]
    async fn aborted_stop_task_reverts_to_running() {
        let transport = ScriptedTransport::new();
        let controller = Arc::new(helpers::running_serial(&transport).await);
        transport.script(commands::STOP_SERIAL_SERVER, Reply::Hang);

        let task = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.stop().await }
        });
        transport.wait_for_calls(2).await;
        assert_eq!(controller.status(), ServiceStatus::Stopping);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let state = controller.current_state();
        assert_eq!(state.status, ServiceStatus::Running);
        assert_eq!(
            state.last_error.as_deref(),
            Some("stop_serial_server cancelled")
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Whatever the backend answers, every request leaves the controller in a
    /// stable status; completions clear the error and failures record it.
    #[test]
    fn settles_in_stable_state(steps in prop::collection::vec((any::<bool>(), 0u8..4), 1..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let transport = ScriptedTransport::new();
            let controller = helpers::serial(&transport);

            for (is_start, reply) in steps {
                let command = if is_start {
                    commands::START_SERIAL_SERVER
                } else {
                    commands::STOP_SERIAL_SERVER
                };
                let reply = match reply {
                    0 => Reply::Ok(json!(true)),
                    1 => Reply::Ok(json!(false)),
                    2 => Reply::Err(json!("backend said no")),
                    _ => Reply::Err(json!({"code": 7})),
                };
                transport.script(command, reply);

                let before = controller.status();
                let calls_before = transport.calls().len();
                let outcome = if is_start {
                    controller.start(&helpers::com3()).await
                } else {
                    controller.stop().await
                };
                let state = controller.current_state();

                prop_assert!(!state.status.is_transitional());
                match outcome {
                    TransitionOutcome::Completed(status) => {
                        prop_assert_eq!(status, state.status);
                        prop_assert!(state.last_error.is_none());
                    }
                    TransitionOutcome::Failed(message) => {
                        prop_assert_eq!(state.status, before);
                        prop_assert_eq!(state.last_error, Some(message));
                    }
                    TransitionOutcome::Rejected(_) => {
                        prop_assert_eq!(state.status, before);
                        prop_assert_eq!(transport.calls().len(), calls_before);
                    }
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
