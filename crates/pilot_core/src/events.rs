use std::sync::{PoisonError, RwLock};

use shared::domain::{Event, EventKind};
use tracing::trace;

pub type MessageReceivedCallback = Box<dyn Fn(&str, &str) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    message_received: Option<MessageReceivedCallback>,
}

/// At most one callback per event kind. Emitting runs the callback on the
/// caller's thread and returns only once it has finished.
#[derive(Default)]
pub struct EventBus {
    callbacks: RwLock<Callbacks>,
}

impl EventBus {
    /// Registers `callback(chat, message)`, replacing any previous one.
    pub fn on_message_received<F>(&self, callback: F)
    where
        F: Fn(&str, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .message_received = Some(Box::new(callback));
    }

    pub fn clear(&self, kind: EventKind) {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        match kind {
            EventKind::MessageReceived => callbacks.message_received = None,
        }
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        let callbacks = self.callbacks.read().unwrap_or_else(PoisonError::into_inner);
        match kind {
            EventKind::MessageReceived => callbacks.message_received.is_some(),
        }
    }

    /// Errors from the callback are handed back untouched. The callback runs
    /// under the registry read lock and must not register callbacks itself.
    pub fn emit(&self, event: &Event) -> anyhow::Result<()> {
        let callbacks = self.callbacks.read().unwrap_or_else(PoisonError::into_inner);
        match event {
            Event::MessageReceived { chat, message } => match &callbacks.message_received {
                Some(callback) => callback(chat, message),
                None => {
                    trace!(kind = %event.kind(), "no callback registered");
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
