use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid controller status ordinal {0}; expected 0 (stopped), 1 (starting) or 2 (running)")]
pub struct InvalidStatus(pub u8);
