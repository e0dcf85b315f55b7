use std::sync::{Arc, OnceLock};

use gesture_driver::GestureDriver;
use regex::Regex;
use shared::domain::{ScreenState, ScreenTag};
use tracing::{debug, error, warn};

use crate::config::PilotSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub success: bool,
    pub state: ScreenState,
}

impl Reconciliation {
    fn reached(state: ScreenState) -> Self {
        Self {
            success: true,
            state,
        }
    }

    fn failed(state: ScreenState) -> Self {
        Self {
            success: false,
            state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    LeaveChat,
    EnterChat,
    SwitchChat,
}

const TRANSITIONS: &[((ScreenTag, ScreenTag), Transition)] = &[
    ((ScreenTag::Chat, ScreenTag::Main), Transition::LeaveChat),
    ((ScreenTag::Main, ScreenTag::Chat), Transition::EnterChat),
    ((ScreenTag::Chat, ScreenTag::Chat), Transition::SwitchChat),
];

fn lookup(from: ScreenTag, to: ScreenTag) -> Option<Transition> {
    TRANSITIONS
        .iter()
        .find(|(key, _)| *key == (from, to))
        .map(|(_, transition)| *transition)
}

enum Hop {
    Arrived,
    Via(ScreenState),
    Refused,
}

/// Ways to open a chat from the main screen, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryStrategy {
    DirectTap,
    Search,
    DeepLink,
}

const ENTRY_CHAIN: [EntryStrategy; 3] = [
    EntryStrategy::DirectTap,
    EntryStrategy::Search,
    EntryStrategy::DeepLink,
];

enum Attempt {
    Entered,
    Missed,
    GiveUp,
}

fn deep_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{11,13}").expect("deep link pattern is valid"))
}

/// Phone-number-shaped identifiers (a run of 11 to 13 digits) can be reached
/// through a deep link when search fails.
pub fn is_deep_link_eligible(identifier: &str) -> bool {
    deep_link_pattern().is_match(identifier)
}

pub struct StateReconciler {
    driver: Arc<dyn GestureDriver>,
    settings: Arc<PilotSettings>,
}

impl StateReconciler {
    pub fn new(driver: Arc<dyn GestureDriver>, settings: Arc<PilotSettings>) -> Self {
        Self { driver, settings }
    }

    pub fn driver(&self) -> &dyn GestureDriver {
        self.driver.as_ref()
    }

    pub async fn reconcile(&self, from: ScreenState, to: ScreenState) -> Reconciliation {
        let mut current = from;
        for _ in 0..self.settings.max_transition_hops {
            let Some(transition) = lookup(current.tag(), to.tag()) else {
                debug!(from = %current, to = %to, "no transition between screens");
                return Reconciliation::failed(current);
            };
            match self.apply(transition, &current, &to).await {
                Hop::Arrived => return Reconciliation::reached(to),
                Hop::Via(next) => current = next,
                Hop::Refused => return Reconciliation::failed(current),
            }
        }

        error!(
            from = %current,
            to = %to,
            max_hops = self.settings.max_transition_hops,
            "transition did not settle within hop bound"
        );
        Reconciliation::failed(current)
    }

    async fn apply(&self, transition: Transition, from: &ScreenState, to: &ScreenState) -> Hop {
        match transition {
            Transition::LeaveChat => {
                self.driver.navigate_back().await;
                Hop::Arrived
            }
            Transition::EnterChat => match to.chat_identifier() {
                Some(target) => self.enter_chat(target).await,
                None => Hop::Refused,
            },
            Transition::SwitchChat => {
                if from == to {
                    return Hop::Arrived;
                }
                self.driver.navigate_back().await;
                Hop::Via(ScreenState::Main)
            }
        }
    }

    async fn enter_chat(&self, target: &str) -> Hop {
        for strategy in ENTRY_CHAIN {
            let attempt = match strategy {
                EntryStrategy::DirectTap => self.tap_directly(target).await,
                EntryStrategy::Search => self.tap_from_search(target).await,
                EntryStrategy::DeepLink => self.open_deep_link(target).await,
            };
            match attempt {
                Attempt::Entered => return Hop::Arrived,
                Attempt::Missed => continue,
                Attempt::GiveUp => return Hop::Refused,
            }
        }
        Hop::Refused
    }

    async fn tap_directly(&self, target: &str) -> Attempt {
        if self.driver.tap_chat(target).await {
            return Attempt::Entered;
        }
        debug!(chat = %target, "chat not on main screen, trying search bar");
        Attempt::Missed
    }

    async fn tap_from_search(&self, target: &str) -> Attempt {
        if !self.driver.search_chat(target).await {
            debug!(chat = %target, "search bar unavailable");
            return Attempt::GiveUp;
        }
        if self.driver.tap_chat(target).await {
            return Attempt::Entered;
        }
        debug!(chat = %target, "chat not in search results, trying deep link");
        self.driver.navigate_back().await;
        self.driver.navigate_back().await;
        Attempt::Missed
    }

    async fn open_deep_link(&self, target: &str) -> Attempt {
        if !is_deep_link_eligible(target) {
            debug!(chat = %target, "not a valid phone number");
            return Attempt::GiveUp;
        }

        let placeholder = self.settings.placeholder_chat.as_str();
        if !(self.driver.search_chat(placeholder).await && self.driver.tap_chat(placeholder).await)
        {
            warn!(
                chat = %target,
                placeholder,
                "placeholder chat not found (create an empty group with this name); \
                 believed state may be out of sync with the app"
            );
            return Attempt::GiveUp;
        }

        let link = self.settings.deep_link_for(target);
        if !(self.driver.send_text(&link).await && self.driver.tap_last_link_in_chat().await) {
            warn!(
                chat = %target,
                %link,
                "deep link sequence interrupted; believed state may be out of sync with the app"
            );
            self.driver.navigate_back().await;
            return Attempt::GiveUp;
        }

        if self.driver.dismiss_confirmation_dialog().await {
            debug!(chat = %target, "number is not registered in the app");
            return Attempt::GiveUp;
        }
        Attempt::Entered
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
