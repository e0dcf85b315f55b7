use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gesture_driver::{DriverScript, Gesture, ScriptedDriver};
use serde::Deserialize;
use serde_json::json;

use crate::config::PilotSettings;

#[derive(Deserialize)]
struct OpenPayload {
    chat: String,
}

/// Opens a chat and counts how often it ran.
struct OpenChat {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl TypedAction for OpenChat {
    type Payload = OpenPayload;

    async fn run(
        &self,
        scope: &ActionScope<'_>,
        current: ScreenState,
        payload: OpenPayload,
    ) -> ScreenState {
        self.runs.fetch_add(1, Ordering::SeqCst);
        scope
            .reconciler
            .reconcile(current, ScreenState::chat(payload.chat))
            .await
            .state
    }
}

struct Fixture {
    driver: Arc<ScriptedDriver>,
    buffer: Arc<ActionBuffer>,
    runs: Arc<AtomicUsize>,
    dispatcher: ActionDispatcher,
}

fn fixture(script: DriverScript) -> Fixture {
    let driver = Arc::new(ScriptedDriver::new(script));
    let context = PilotContext::new(PilotSettings::default());
    let reconciler = Arc::new(StateReconciler::new(
        driver.clone(),
        context.settings.clone(),
    ));
    let runs = Arc::new(AtomicUsize::new(0));
    let registry = ActionRegistry::builder()
        .register("open_chat", OpenChat { runs: runs.clone() })
        .build();
    let buffer = Arc::new(ActionBuffer::default());
    let dispatcher =
        ActionDispatcher::new(buffer.clone(), Arc::new(registry), reconciler, context);

    Fixture {
        driver,
        buffer,
        runs,
        dispatcher,
    }
}

#[tokio::test]
async fn empty_buffer_leaves_state_alone() {
    let fx = fixture(DriverScript::default());

    let state = fx
        .dispatcher
        .step(ScreenState::chat("alice"))
        .await
        .expect("step");
    assert_eq!(state, ScreenState::chat("alice"));
    assert_eq!(fx.runs.load(Ordering::SeqCst), 0);
    assert!(fx.driver.gestures().is_empty());
}

#[tokio::test]
async fn send_message_enters_chat_and_types() {
    let fx = fixture(DriverScript::default().main_chat("alice"));
    fx.buffer.push(Action::send_message("alice", "hello")).expect("push");

    let state = fx.dispatcher.step(ScreenState::Main).await.expect("step");
    assert_eq!(state, ScreenState::chat("alice"));
    assert_eq!(
        fx.driver.sent_messages(),
        vec![("alice".to_string(), "hello".to_string())]
    );
}

#[tokio::test]
async fn send_message_to_unreachable_chat_sends_nothing() {
    let fx = fixture(DriverScript::default().without_search());
    fx.buffer.push(Action::send_message("ghost", "hello")).expect("push");

    let state = fx.dispatcher.step(ScreenState::Main).await.expect("step");
    assert_eq!(state, ScreenState::Main);
    assert!(fx.driver.sent_messages().is_empty());
    assert!(fx.buffer.is_empty());
}

#[tokio::test]
async fn custom_action_runs_registered_handler() {
    let fx = fixture(DriverScript::default().main_chat("bob"));
    fx.buffer
        .push(Action::custom("open_chat", json!({ "chat": "bob" })))
        .expect("push");

    let state = fx.dispatcher.step(ScreenState::Main).await.expect("step");
    assert_eq!(state, ScreenState::chat("bob"));
    assert_eq!(fx.runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mismatched_payload_is_dropped_without_running() {
    let fx = fixture(DriverScript::default().main_chat("bob"));
    fx.buffer
        .push(Action::custom("open_chat", json!({ "chat": 42 })))
        .expect("push");

    let state = fx.dispatcher.step(ScreenState::Main).await.expect("step");
    assert_eq!(state, ScreenState::Main);
    assert_eq!(fx.runs.load(Ordering::SeqCst), 0);
    assert!(fx.buffer.is_empty());
    assert!(fx.driver.gestures().is_empty());
}

#[tokio::test]
async fn unknown_kind_is_fatal() {
    let fx = fixture(DriverScript::default());
    fx.buffer
        .push(Action::custom("teleport", json!(null)))
        .expect("push");

    let err = fx
        .dispatcher
        .step(ScreenState::Main)
        .await
        .expect_err("unknown kind");
    assert!(matches!(err, PilotError::UnknownAction(kind) if kind == "teleport"));
}

#[tokio::test]
async fn newest_action_is_dispatched_first() {
    let fx = fixture(DriverScript::default().main_chat("alice").main_chat("bob"));
    fx.buffer.push(Action::send_message("alice", "first")).expect("push");
    fx.buffer.push(Action::send_message("bob", "second")).expect("push");

    let state = fx.dispatcher.step(ScreenState::Main).await.expect("step");
    assert_eq!(state, ScreenState::chat("bob"));
    assert_eq!(fx.buffer.len(), 1);

    let state = fx.dispatcher.step(state).await.expect("step");
    assert_eq!(state, ScreenState::chat("alice"));
    assert_eq!(
        fx.driver.gestures(),
        vec![
            Gesture::TapChat("bob".into()),
            Gesture::SendText("second".into()),
            Gesture::NavigateBack,
            Gesture::TapChat("alice".into()),
            Gesture::SendText("first".into()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pushes_during_active_steps_are_neither_lost_nor_repeated() {
    const PRODUCERS: usize = 3;
    const PER_PRODUCER: usize = 50;

    let fx = fixture(DriverScript::default().main_chat("alice"));
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let buffer = fx.buffer.clone();
            std::thread::spawn(move || {
                for _ in 0..PER_PRODUCER {
                    buffer
                        .push(Action::custom("open_chat", json!({"chat": "alice"})))
                        .expect("push");
                    std::thread::yield_now();
                }
            })
        })
        .collect();

    let mut state = ScreenState::Main;
    let mut steps = 0;
    while steps < PRODUCERS * PER_PRODUCER * 4 {
        state = fx.dispatcher.step(state).await.expect("step");
        steps += 1;
        if producers.iter().all(|p| p.is_finished()) && fx.buffer.is_empty() {
            break;
        }
    }
    for producer in producers {
        producer.join().expect("producer");
    }
    while !fx.buffer.is_empty() {
        state = fx.dispatcher.step(state).await.expect("step");
    }

    assert_eq!(fx.runs.load(Ordering::SeqCst), PRODUCERS * PER_PRODUCER);
    assert_eq!(state, ScreenState::chat("alice"));
}
