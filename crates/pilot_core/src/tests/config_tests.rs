use super::*;

use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_documented_values() {
    let settings = PilotSettings::default();
    assert_eq!(settings.loop_delay(), Duration::from_millis(250));
    assert_eq!(settings.max_transition_hops, 4);
    assert_eq!(settings.placeholder_chat, "!temp");
    assert_eq!(settings.deep_link_for("919876543210"), "wa.me/919876543210");
    assert_eq!(
        settings.callback_failure_policy,
        CallbackFailurePolicy::LogAndContinue
    );
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings(dir.path().join("absent.toml")).expect("load");
    assert_eq!(settings.placeholder_chat, PilotSettings::default().placeholder_chat);
}

#[test]
fn file_values_override_defaults_and_keep_the_rest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pilot.toml");
    fs::write(
        &path,
        "loop_delay_ms = 10\ncallback_failure_policy = \"stop_controller\"\n",
    )
    .expect("write settings");

    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.loop_delay_ms, 10);
    assert_eq!(
        settings.callback_failure_policy,
        CallbackFailurePolicy::StopController
    );
    assert_eq!(settings.deep_link_prefix, "wa.me/");
}

#[test]
fn malformed_file_is_reported_with_its_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pilot.toml");
    fs::write(&path, "loop_delay_ms = \"soon\"\n").expect("write settings");

    let err = load_settings(&path).expect_err("malformed");
    assert!(matches!(err, PilotError::Settings { .. }));
    assert!(err.to_string().contains("pilot.toml"));
}

#[test]
fn env_overrides_apply_and_invalid_values_are_ignored() {
    let mut settings = PilotSettings::default();
    apply_env_overrides(
        &mut settings,
        lookup_from(&[
            ("PILOT__LOOP_DELAY_MS", "5"),
            ("PILOT__MAX_TRANSITION_HOPS", "0"),
            ("PILOT__PLACEHOLDER_CHAT", "!scratch"),
            ("PILOT__CALLBACK_FAILURE_POLICY", "Stop_Controller"),
        ]),
    );

    assert_eq!(settings.loop_delay_ms, 5);
    assert_eq!(settings.max_transition_hops, 4);
    assert_eq!(settings.placeholder_chat, "!scratch");
    assert_eq!(
        settings.callback_failure_policy,
        CallbackFailurePolicy::StopController
    );
}

#[test]
fn too_small_hop_bound_from_file_is_raised_to_minimum() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pilot.toml");
    fs::write(&path, "max_transition_hops = 0\n").expect("write settings");

    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.max_transition_hops, MIN_TRANSITION_HOPS);
}

#[test]
fn env_hop_bound_below_minimum_is_ignored() {
    let mut settings = PilotSettings::default();
    apply_env_overrides(
        &mut settings,
        lookup_from(&[("PILOT__MAX_TRANSITION_HOPS", "1")]),
    );
    assert_eq!(settings.max_transition_hops, 4);

    apply_env_overrides(
        &mut settings,
        lookup_from(&[("PILOT__MAX_TRANSITION_HOPS", "2")]),
    );
    assert_eq!(settings.max_transition_hops, 2);
}
