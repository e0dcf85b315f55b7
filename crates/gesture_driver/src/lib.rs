use async_trait::async_trait;
use shared::domain::ChatHandle;

mod scripted;
pub use scripted::{DriverScript, DriverScriptError, IncomingChat, ScriptedDriver, SimScreen};

#[async_trait]
pub trait GestureDriver: Send + Sync {
    async fn navigate_back(&self);
    /// Taps the chat named `identifier` in the list currently on screen.
    async fn tap_chat(&self, identifier: &str) -> bool;
    /// Opens the search UI and types `identifier`. `false` means search
    /// could not be opened at all.
    async fn search_chat(&self, identifier: &str) -> bool;
    async fn send_text(&self, text: &str) -> bool;
    async fn tap_last_link_in_chat(&self) -> bool;
    /// `true` when a confirmation dialog was on screen and got dismissed.
    async fn dismiss_confirmation_dialog(&self) -> bool;
    async fn poll_new_chat(&self) -> Option<ChatHandle>;
    /// Unread messages of the open chat, oldest first.
    async fn poll_new_messages(&self) -> Vec<String>;
}

/// One recorded driver call, in the order it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    NavigateBack,
    TapChat(String),
    SearchChat(String),
    SendText(String),
    TapLastLink,
    DismissDialog,
    PollNewChat,
    PollNewMessages,
}
