use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use gesture_driver::GestureDriver;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use shared::domain::ScreenState;
use tracing::{debug, warn};

use crate::{context::PilotContext, reconciler::StateReconciler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SendMessage(SendMessage),
    Custom { kind: String, payload: Value },
}

impl Action {
    pub fn send_message(chat: impl Into<String>, text: impl Into<String>) -> Self {
        Self::SendMessage(SendMessage {
            chat: chat.into(),
            text: text.into(),
        })
    }

    pub fn custom(kind: impl Into<String>, payload: Value) -> Self {
        Self::Custom {
            kind: kind.into(),
            payload,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::SendMessage(_) => "send_message",
            Self::Custom { kind, .. } => kind,
        }
    }
}

/// What a handler gets to work with besides its payload.
pub struct ActionScope<'a> {
    pub driver: &'a dyn GestureDriver,
    pub reconciler: &'a StateReconciler,
    pub context: &'a PilotContext,
}

/// A handler with a statically typed payload. The returned state becomes the
/// believed state, so it must only name screens the gestures confirmed.
#[async_trait]
pub trait TypedAction: Send + Sync + 'static {
    type Payload: DeserializeOwned + Send;

    async fn run(
        &self,
        scope: &ActionScope<'_>,
        current: ScreenState,
        payload: Self::Payload,
    ) -> ScreenState;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadMismatch {
    pub expected: &'static str,
    pub actual: String,
    pub reason: String,
}

impl fmt::Display for PayloadMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {} got {} ({})",
            self.expected, self.actual, self.reason
        )
    }
}

/// Compact rendering of a JSON value's shape, e.g. `{chat: string, n: number}`.
pub fn describe_shape(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(describe_shape).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(key, field)| format!("{key}: {}", describe_shape(field)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[async_trait]
trait ErasedAction: Send + Sync {
    async fn run_json(
        &self,
        scope: &ActionScope<'_>,
        current: ScreenState,
        payload: Value,
    ) -> Result<ScreenState, PayloadMismatch>;
}

struct Erased<A>(A);

#[async_trait]
impl<A: TypedAction> ErasedAction for Erased<A> {
    async fn run_json(
        &self,
        scope: &ActionScope<'_>,
        current: ScreenState,
        payload: Value,
    ) -> Result<ScreenState, PayloadMismatch> {
        let typed = A::Payload::deserialize(&payload).map_err(|err| PayloadMismatch {
            expected: std::any::type_name::<A::Payload>(),
            actual: describe_shape(&payload),
            reason: err.to_string(),
        })?;
        Ok(self.0.run(scope, current, typed).await)
    }
}

/// Kind-to-handler table. Built once, read-only afterwards.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Box<dyn ErasedAction>>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// `None` when `kind` was never registered.
    pub(crate) async fn run(
        &self,
        kind: &str,
        scope: &ActionScope<'_>,
        current: ScreenState,
        payload: Value,
    ) -> Option<Result<ScreenState, PayloadMismatch>> {
        let handler = self.handlers.get(kind)?;
        Some(handler.run_json(scope, current, payload).await)
    }
}

#[derive(Default)]
pub struct ActionRegistryBuilder {
    handlers: HashMap<String, Box<dyn ErasedAction>>,
}

impl ActionRegistryBuilder {
    pub fn register<A: TypedAction>(mut self, kind: impl Into<String>, action: A) -> Self {
        let kind = kind.into();
        if self
            .handlers
            .insert(kind.clone(), Box::new(Erased(action)))
            .is_some()
        {
            warn!(%kind, "action kind registered twice; keeping the latest handler");
        }
        self
    }

    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            handlers: self.handlers,
        }
    }
}

/// Opens the chat and types the text into it.
pub struct SendMessageHandler;

#[async_trait]
impl TypedAction for SendMessageHandler {
    type Payload = SendMessage;

    async fn run(
        &self,
        scope: &ActionScope<'_>,
        current: ScreenState,
        payload: SendMessage,
    ) -> ScreenState {
        let outcome = scope
            .reconciler
            .reconcile(current, ScreenState::chat(payload.chat.as_str()))
            .await;
        if !outcome.success {
            warn!(chat = %payload.chat, "could not open chat; message not sent");
            return outcome.state;
        }

        if scope.driver.send_text(&payload.text).await {
            debug!(chat = %payload.chat, "message sent");
        } else {
            warn!(chat = %payload.chat, "send gesture failed; message may not have been delivered");
        }
        outcome.state
    }
}

#[cfg(test)]
#[path = "tests/actions_tests.rs"]
mod tests;
