use std::sync::Arc;

use gesture_driver::GestureDriver;
use shared::domain::{Event, ScreenState};
use tracing::{debug, warn};

use crate::{context::PilotContext, error::PilotError, reconciler::StateReconciler};

/// Looks for a chat with new activity and reports its messages.
pub struct ActivityChecker {
    reconciler: Arc<StateReconciler>,
    context: PilotContext,
}

impl ActivityChecker {
    pub fn new(reconciler: Arc<StateReconciler>, context: PilotContext) -> Self {
        Self {
            reconciler,
            context,
        }
    }

    /// Returns to the main screen, opens at most one chat with new activity
    /// and emits `MessageReceived` for its messages in arrival order.
    ///
    /// A failing callback stops the remaining emissions; the error carries
    /// the believed state reached so far.
    pub async fn poll(&self, current: ScreenState) -> Result<ScreenState, PilotError> {
        let current = self.reconciler.reconcile(current, ScreenState::Main).await.state;

        let Some(chat) = self.reconciler.driver().poll_new_chat().await else {
            return Ok(current);
        };
        debug!(chat = %chat.name, "new activity");

        let entered = self
            .reconciler
            .reconcile(current, ScreenState::chat(chat.name.as_str()))
            .await;
        if !entered.success {
            warn!(
                chat = %chat.name,
                "could not open chat with new activity; skipping its messages"
            );
            return Ok(entered.state);
        }

        let messages = self.reconciler.driver().poll_new_messages().await;
        for message in messages {
            let event = Event::MessageReceived {
                chat: chat.name.clone(),
                message,
            };
            if let Err(source) = self.context.events.emit(&event) {
                return Err(PilotError::Callback {
                    event: event.kind(),
                    believed: entered.state,
                    source,
                });
            }
        }
        Ok(entered.state)
    }
}

#[cfg(test)]
#[path = "tests/checker_tests.rs"]
mod tests;
