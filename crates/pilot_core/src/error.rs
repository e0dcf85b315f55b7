use std::path::PathBuf;

use shared::domain::{EventKind, ScreenState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PilotError {
    /// A custom action names a kind nobody registered. Configuration bug,
    /// never retried.
    #[error("no handler registered for action kind '{0}'")]
    UnknownAction(String),
    #[error("{event} callback failed while believed state was {believed}: {source}")]
    Callback {
        event: EventKind,
        believed: ScreenState,
        source: anyhow::Error,
    },
    #[error("controller was already started")]
    AlreadyStarted,
    #[error("controller is shutting down; no new work accepted")]
    ShuttingDown,
    #[error("controller loop is not running (never started or already joined)")]
    NotRunning,
    #[error("controller must be started from within a tokio runtime")]
    NoRuntime,
    #[error("coordination loop aborted: {0}")]
    LoopAborted(String),
    #[error("invalid settings in '{}': {source}", path.display())]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },
}
