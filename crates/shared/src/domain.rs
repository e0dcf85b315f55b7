use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidStatus;

/// Which screen the remote chat app is believed to be showing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "screen", content = "chat", rename_all = "snake_case")]
pub enum ScreenState {
    #[default]
    Main,
    Chat(String),
}

impl ScreenState {
    pub fn chat(identifier: impl Into<String>) -> Self {
        Self::Chat(identifier.into())
    }

    pub fn tag(&self) -> ScreenTag {
        match self {
            Self::Main => ScreenTag::Main,
            Self::Chat(_) => ScreenTag::Chat,
        }
    }

    pub fn chat_identifier(&self) -> Option<&str> {
        match self {
            Self::Main => None,
            Self::Chat(identifier) => Some(identifier),
        }
    }
}

impl fmt::Display for ScreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Chat(identifier) => write!(f, "chat({identifier})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenTag {
    Main,
    Chat,
}

/// A chat the driver noticed on the main screen with unread activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHandle {
    pub name: String,
}

impl ChatHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Controller lifecycle. The ordinals are significant: `is_on` and
/// `has_started` are defined by comparison against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ControllerStatus {
    Stopped = 0,
    Starting = 1,
    Running = 2,
}

impl TryFrom<u8> for ControllerStatus {
    type Error = InvalidStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stopped),
            1 => Ok(Self::Starting),
            2 => Ok(Self::Running),
            other => Err(InvalidStatus(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MessageReceived,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageReceived => f.write_str("message_received"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    MessageReceived { chat: String, message: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageReceived { .. } => EventKind::MessageReceived,
        }
    }
}
