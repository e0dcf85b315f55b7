use super::*;

use std::sync::{Arc, Mutex};

use anyhow::anyhow;

fn message(chat: &str, text: &str) -> Event {
    Event::MessageReceived {
        chat: chat.into(),
        message: text.into(),
    }
}

#[test]
fn emit_without_callback_is_a_no_op() {
    let bus = EventBus::default();
    assert!(!bus.is_registered(EventKind::MessageReceived));
    bus.emit(&message("alice", "hi")).expect("no-op emit");
}

#[test]
fn callback_receives_positional_params() {
    let bus = EventBus::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.on_message_received(move |chat, text| {
        sink.lock().unwrap().push((chat.to_string(), text.to_string()));
        Ok(())
    });

    bus.emit(&message("alice", "hi")).expect("emit");
    bus.emit(&message("bob", "yo")).expect("emit");

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("alice".to_string(), "hi".to_string()),
            ("bob".to_string(), "yo".to_string()),
        ]
    );
}

#[test]
fn callback_error_is_propagated() {
    let bus = EventBus::default();
    bus.on_message_received(|_, _| Err(anyhow!("sink offline")));

    let err = bus.emit(&message("alice", "hi")).expect_err("callback error");
    assert_eq!(err.to_string(), "sink offline");
}

#[test]
fn clearing_unregisters_the_callback() {
    let bus = EventBus::default();
    bus.on_message_received(|_, _| Err(anyhow!("should not run")));
    bus.clear(EventKind::MessageReceived);

    assert!(!bus.is_registered(EventKind::MessageReceived));
    bus.emit(&message("alice", "hi")).expect("cleared");
}
