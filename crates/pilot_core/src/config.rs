use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

use crate::error::PilotError;

// Leaving a chat and entering another takes two hops; fewer makes
// chat-to-chat switches and returns to the main list fail.
pub const MIN_TRANSITION_HOPS: usize = 2;

/// What the coordination loop does when an event callback returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackFailurePolicy {
    #[default]
    LogAndContinue,
    StopController,
}

impl CallbackFailurePolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "log_and_continue" => Some(Self::LogAndContinue),
            "stop_controller" => Some(Self::StopController),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PilotSettings {
    pub loop_delay_ms: u64,
    pub max_transition_hops: usize,
    pub placeholder_chat: String,
    pub deep_link_prefix: String,
    pub callback_failure_policy: CallbackFailurePolicy,
}

impl Default for PilotSettings {
    fn default() -> Self {
        Self {
            loop_delay_ms: 250,
            max_transition_hops: 4,
            placeholder_chat: "!temp".into(),
            deep_link_prefix: "wa.me/".into(),
            callback_failure_policy: CallbackFailurePolicy::LogAndContinue,
        }
    }
}

impl PilotSettings {
    pub fn loop_delay(&self) -> Duration {
        Duration::from_millis(self.loop_delay_ms)
    }

    pub fn deep_link_for(&self, identifier: &str) -> String {
        format!("{}{identifier}", self.deep_link_prefix)
    }
}

/// Reads `path` when it exists, then applies `PILOT__*` environment
/// overrides. A missing file yields defaults; a malformed one is an error.
pub fn load_settings(path: impl AsRef<Path>) -> Result<PilotSettings, PilotError> {
    let path = path.as_ref();
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<PilotSettings>(&raw).map_err(|source| {
            PilotError::Settings {
                path: path.to_path_buf(),
                source,
            }
        })?,
        Err(_) => PilotSettings::default(),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    enforce_minimums(&mut settings);
    Ok(settings)
}

fn apply_env_overrides(settings: &mut PilotSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PILOT__LOOP_DELAY_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.loop_delay_ms = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric PILOT__LOOP_DELAY_MS"),
        }
    }
    if let Some(v) = lookup("PILOT__MAX_TRANSITION_HOPS") {
        match v.parse::<usize>() {
            Ok(parsed) if parsed >= MIN_TRANSITION_HOPS => settings.max_transition_hops = parsed,
            _ => warn!(value = %v, "ignoring invalid PILOT__MAX_TRANSITION_HOPS"),
        }
    }
    if let Some(v) = lookup("PILOT__PLACEHOLDER_CHAT") {
        settings.placeholder_chat = v;
    }
    if let Some(v) = lookup("PILOT__DEEP_LINK_PREFIX") {
        settings.deep_link_prefix = v;
    }
    if let Some(v) = lookup("PILOT__CALLBACK_FAILURE_POLICY") {
        match CallbackFailurePolicy::parse(&v) {
            Some(policy) => settings.callback_failure_policy = policy,
            None => warn!(value = %v, "ignoring unknown PILOT__CALLBACK_FAILURE_POLICY"),
        }
    }
}

fn enforce_minimums(settings: &mut PilotSettings) {
    if settings.max_transition_hops < MIN_TRANSITION_HOPS {
        warn!(
            configured = settings.max_transition_hops,
            using = MIN_TRANSITION_HOPS,
            "max_transition_hops too small; raising it"
        );
        settings.max_transition_hops = MIN_TRANSITION_HOPS;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
