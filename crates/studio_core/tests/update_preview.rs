use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use studio_core::{update, AppState, Effect, FileBundle, Msg};

fn stream_file(state: AppState, path: &str, code: &str, now: Instant) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StreamLine {
            line: format!(
                "data: {}",
                serde_json::json!({"type": "artifact_file", "path": path, "code": code})
            ),
            now,
        },
    )
}

fn start(state: AppState) -> AppState {
    let at: DateTime<Utc> = DateTime::from_timestamp(0, 0).expect("epoch");
    let (state, _) = update(
        state,
        Msg::PromptSubmitted {
            content: "go".to_string(),
            at,
        },
    );
    state
}

#[test]
fn bundle_waits_for_sandbox_ready() {
    let now = Instant::now();
    let state = start(AppState::new());
    let (state, effects) = stream_file(state, "/App.tsx", "x", now);
    assert!(effects.is_empty());
    assert_eq!(state.view().preview, None);
    assert!(!state.is_preview_settled());

    let (mut state, effects) = update(state, Msg::SandboxReady);
    let expected: FileBundle = [("/App.tsx", "x")].into_iter().collect();
    assert_eq!(effects, vec![Effect::ShowPreview(expected.clone())]);
    assert_eq!(state.view().preview, Some(expected));
    assert!(state.view().sandbox_ready);
    assert!(state.consume_dirty());
}

#[test]
fn only_the_latest_pending_bundle_is_shown() {
    let now = Instant::now();
    let state = start(AppState::with_emit_interval(Duration::ZERO));
    let (state, _) = stream_file(state, "/a", "1", now);
    let (state, _) = stream_file(state, "/a", "2", now + Duration::from_millis(1));

    let (_, effects) = update(state, Msg::SandboxReady);
    let expected: FileBundle = [("/a", "2")].into_iter().collect();
    assert_eq!(effects, vec![Effect::ShowPreview(expected)]);
}

#[test]
fn ready_without_pending_bundle_shows_nothing() {
    let (state, effects) = update(AppState::new(), Msg::SandboxReady);
    assert!(effects.is_empty());
    assert!(state.view().sandbox_ready);
    assert!(state.is_preview_settled());
}
