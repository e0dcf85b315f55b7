use std::{
    collections::{HashMap, HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use serde::Deserialize;
use shared::domain::ChatHandle;
use thiserror::Error;
use tracing::trace;

use crate::{Gesture, GestureDriver};

#[derive(Debug, Error)]
pub enum DriverScriptError {
    #[error("failed to read driver script '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid driver script: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Initial layout of the simulated remote app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriverScript {
    /// Chats listed on the main screen, tappable without searching.
    pub main_chats: Vec<String>,
    /// Chats only reachable through the search UI.
    pub searchable_chats: Vec<String>,
    /// Phone numbers a deep link resolves to.
    pub registered_numbers: Vec<String>,
    pub search_unavailable: bool,
    pub links_unavailable: bool,
    /// Chats that will surface, one per poll, with their unread messages.
    pub incoming: Vec<IncomingChat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingChat {
    pub chat: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl DriverScript {
    pub fn from_toml_str(raw: &str) -> Result<Self, DriverScriptError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriverScriptError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DriverScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn main_chat(mut self, name: impl Into<String>) -> Self {
        self.main_chats.push(name.into());
        self
    }

    pub fn searchable_chat(mut self, name: impl Into<String>) -> Self {
        self.searchable_chats.push(name.into());
        self
    }

    pub fn registered_number(mut self, number: impl Into<String>) -> Self {
        self.registered_numbers.push(number.into());
        self
    }

    pub fn incoming<I, S>(mut self, chat: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incoming.push(IncomingChat {
            chat: chat.into(),
            messages: messages.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn without_search(mut self) -> Self {
        self.search_unavailable = true;
        self
    }

    pub fn without_links(mut self) -> Self {
        self.links_unavailable = true;
        self
    }
}

/// What the simulated app is really showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimScreen {
    Main,
    Search { query: String },
    Chat(String),
    LinkDialog { chat: String },
}

struct SimState {
    screen: SimScreen,
    main_chats: Vec<String>,
    searchable_chats: HashSet<String>,
    registered_numbers: HashSet<String>,
    search_unavailable: bool,
    links_unavailable: bool,
    incoming: VecDeque<IncomingChat>,
    unread: HashMap<String, Vec<String>>,
    last_sent: HashMap<String, String>,
    sent: Vec<(String, String)>,
    gestures: Vec<Gesture>,
}

/// In-memory stand-in for the remote chat app.
///
/// Navigation follows a small screen model: the main list, a search screen
/// holding one query, an open chat and the "number not on the network"
/// dialog raised by a dead deep link.
pub struct ScriptedDriver {
    state: Mutex<SimState>,
}

impl ScriptedDriver {
    pub fn new(script: DriverScript) -> Self {
        Self {
            state: Mutex::new(SimState {
                screen: SimScreen::Main,
                main_chats: script.main_chats,
                searchable_chats: script.searchable_chats.into_iter().collect(),
                registered_numbers: script.registered_numbers.into_iter().collect(),
                search_unavailable: script.search_unavailable,
                links_unavailable: script.links_unavailable,
                incoming: script.incoming.into(),
                unread: HashMap::new(),
                last_sent: HashMap::new(),
                sent: Vec::new(),
                gestures: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn screen(&self) -> SimScreen {
        self.lock().screen.clone()
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        self.lock().gestures.clone()
    }

    pub fn take_gestures(&self) -> Vec<Gesture> {
        std::mem::take(&mut self.lock().gestures)
    }

    /// `(chat, text)` pairs in send order.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.lock().sent.clone()
    }
}

impl SimState {
    fn record(&mut self, gesture: Gesture) {
        trace!(?gesture, screen = ?self.screen, "simulated gesture");
        self.gestures.push(gesture);
    }

    fn is_known_chat(&self, identifier: &str) -> bool {
        self.main_chats.iter().any(|name| name == identifier)
            || self.searchable_chats.contains(identifier)
    }
}

fn link_target(text: &str) -> Option<&str> {
    let target = text.rsplit('/').next()?;
    (!target.is_empty() && target.chars().all(|c| c.is_ascii_digit())).then_some(target)
}

#[async_trait]
impl GestureDriver for ScriptedDriver {
    async fn navigate_back(&self) {
        let mut state = self.lock();
        state.record(Gesture::NavigateBack);
        state.screen = match std::mem::replace(&mut state.screen, SimScreen::Main) {
            SimScreen::LinkDialog { chat } => SimScreen::Chat(chat),
            _ => SimScreen::Main,
        };
    }

    async fn tap_chat(&self, identifier: &str) -> bool {
        let mut state = self.lock();
        state.record(Gesture::TapChat(identifier.to_string()));
        let reachable = match &state.screen {
            SimScreen::Main => state.main_chats.iter().any(|name| name == identifier),
            SimScreen::Search { query } => query == identifier && state.is_known_chat(identifier),
            SimScreen::Chat(_) | SimScreen::LinkDialog { .. } => false,
        };
        if reachable {
            state.screen = SimScreen::Chat(identifier.to_string());
        }
        reachable
    }

    async fn search_chat(&self, identifier: &str) -> bool {
        let mut state = self.lock();
        state.record(Gesture::SearchChat(identifier.to_string()));
        if state.search_unavailable || state.screen != SimScreen::Main {
            return false;
        }
        state.screen = SimScreen::Search {
            query: identifier.to_string(),
        };
        true
    }

    async fn send_text(&self, text: &str) -> bool {
        let mut state = self.lock();
        state.record(Gesture::SendText(text.to_string()));
        let SimScreen::Chat(chat) = state.screen.clone() else {
            return false;
        };
        state.sent.push((chat.clone(), text.to_string()));
        state.last_sent.insert(chat, text.to_string());
        true
    }

    async fn tap_last_link_in_chat(&self) -> bool {
        let mut state = self.lock();
        state.record(Gesture::TapLastLink);
        if state.links_unavailable {
            return false;
        }
        let SimScreen::Chat(chat) = state.screen.clone() else {
            return false;
        };
        let Some(target) = state
            .last_sent
            .get(&chat)
            .and_then(|text| link_target(text))
            .map(str::to_string)
        else {
            return false;
        };

        state.screen = if state.registered_numbers.contains(&target) {
            SimScreen::Chat(target)
        } else {
            SimScreen::LinkDialog { chat }
        };
        true
    }

    async fn dismiss_confirmation_dialog(&self) -> bool {
        let mut state = self.lock();
        state.record(Gesture::DismissDialog);
        match state.screen.clone() {
            SimScreen::LinkDialog { chat } => {
                state.screen = SimScreen::Chat(chat);
                true
            }
            _ => false,
        }
    }

    async fn poll_new_chat(&self) -> Option<ChatHandle> {
        let mut state = self.lock();
        state.record(Gesture::PollNewChat);
        if state.screen != SimScreen::Main {
            return None;
        }
        let incoming = state.incoming.pop_front()?;
        if !state.main_chats.contains(&incoming.chat) {
            state.main_chats.insert(0, incoming.chat.clone());
        }
        state
            .unread
            .entry(incoming.chat.clone())
            .or_default()
            .extend(incoming.messages);
        Some(ChatHandle::new(incoming.chat))
    }

    async fn poll_new_messages(&self) -> Vec<String> {
        let mut state = self.lock();
        state.record(Gesture::PollNewMessages);
        let SimScreen::Chat(chat) = state.screen.clone() else {
            return Vec::new();
        };
        state.unread.remove(&chat).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "tests/scripted_tests.rs"]
mod tests;
