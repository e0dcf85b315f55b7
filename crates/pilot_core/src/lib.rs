pub mod actions;
pub mod buffer;
pub mod checker;
pub mod config;
pub mod context;
mod controller;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod reconciler;

pub use actions::{Action, ActionRegistry, ActionScope, SendMessage, TypedAction};
pub use config::{load_settings, CallbackFailurePolicy, PilotSettings};
pub use context::PilotContext;
pub use controller::{AtomicStatus, Controller};
pub use error::PilotError;
pub use events::EventBus;
pub use reconciler::{is_deep_link_eligible, Reconciliation, StateReconciler};
