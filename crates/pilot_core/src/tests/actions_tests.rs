use super::*;

use serde_json::json;

struct Noop;

#[async_trait]
impl TypedAction for Noop {
    type Payload = ();

    async fn run(
        &self,
        _scope: &ActionScope<'_>,
        current: ScreenState,
        _payload: (),
    ) -> ScreenState {
        current
    }
}

#[test]
fn action_kind_names_builtin_and_custom() {
    assert_eq!(Action::send_message("alice", "hi").kind(), "send_message");
    assert_eq!(Action::custom("archive", json!({})).kind(), "archive");
}

#[test]
fn shape_description_is_recursive() {
    let shape = describe_shape(&json!({"chat": "alice", "tags": [1, true], "extra": null}));
    assert_eq!(shape, "{chat: string, extra: null, tags: [number, bool]}");
}

#[test]
fn registry_is_built_once_with_all_kinds() {
    let registry = ActionRegistry::builder()
        .register("noop", Noop)
        .register("also_noop", Noop)
        .build();

    assert!(registry.contains("noop"));
    assert!(!registry.contains("send_message"));
    let mut kinds: Vec<&str> = registry.kinds().collect();
    kinds.sort_unstable();
    assert_eq!(kinds, vec!["also_noop", "noop"]);
}

#[test]
fn mismatch_display_names_both_shapes() {
    let mismatch = PayloadMismatch {
        expected: "SendMessage",
        actual: "number".into(),
        reason: "invalid type".into(),
    };
    assert_eq!(
        mismatch.to_string(),
        "expected SendMessage got number (invalid type)"
    );
}
