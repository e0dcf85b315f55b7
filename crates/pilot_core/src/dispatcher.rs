use std::sync::Arc;

use shared::domain::ScreenState;
use tracing::{debug, error, warn};

use crate::{
    actions::{Action, ActionRegistry, ActionScope, SendMessageHandler, TypedAction},
    buffer::ActionBuffer,
    context::PilotContext,
    error::PilotError,
    reconciler::StateReconciler,
};

/// Executes pending actions one at a time, newest first.
pub struct ActionDispatcher {
    buffer: Arc<ActionBuffer>,
    registry: Arc<ActionRegistry>,
    reconciler: Arc<StateReconciler>,
    context: PilotContext,
}

impl ActionDispatcher {
    pub fn new(
        buffer: Arc<ActionBuffer>,
        registry: Arc<ActionRegistry>,
        reconciler: Arc<StateReconciler>,
        context: PilotContext,
    ) -> Self {
        Self {
            buffer,
            registry,
            reconciler,
            context,
        }
    }

    /// Pops and runs one action. The popped action is consumed whatever the
    /// outcome; only an unregistered kind is reported as an error.
    pub async fn step(&self, current: ScreenState) -> Result<ScreenState, PilotError> {
        let Some(action) = self.buffer.pop() else {
            return Ok(current);
        };
        debug!(kind = action.kind(), state = %current, "dispatching action");

        let scope = ActionScope {
            driver: self.reconciler.driver(),
            reconciler: &self.reconciler,
            context: &self.context,
        };

        match action {
            Action::SendMessage(payload) => {
                Ok(SendMessageHandler.run(&scope, current, payload).await)
            }
            Action::Custom { kind, payload } => {
                let fallback = current.clone();
                match self.registry.run(&kind, &scope, current, payload).await {
                    None => {
                        error!(%kind, "no handler registered for action kind");
                        Err(PilotError::UnknownAction(kind))
                    }
                    Some(Err(mismatch)) => {
                        warn!(
                            %kind,
                            expected = mismatch.expected,
                            actual = %mismatch.actual,
                            reason = %mismatch.reason,
                            "action payload has the wrong shape; dropping it"
                        );
                        Ok(fallback)
                    }
                    Some(Ok(next)) => Ok(next),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
