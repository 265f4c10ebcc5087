mod common;

use attredit::{
    CompletionOutcome, EditorState,
    app::{KeyOutcome, route_key},
    presentation::{ActiveList, OutsideClickHub},
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde_json::json;

use common::{Harness, instance};

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

async fn open_hscode(harness: &Harness) {
    harness
        .open("HSCode", instance(42, &[("HSCode", json!(""), true)]))
        .await;
}

#[tokio::test]
async fn escape_requests_completion_not_cancel() {
    let harness = Harness::new(false);
    open_hscode(&harness).await;

    let outcome = route_key::<()>(&harness.editor, None, &press(KeyCode::Esc))
        .await
        .expect("route");

    assert_eq!(
        outcome,
        KeyOutcome::Completion(CompletionOutcome::Declined {
            missing: vec!["HSCode".to_string()]
        })
    );
    assert_eq!(harness.editor.state(), EditorState::Open);
    assert_eq!(harness.host.prompts().len(), 1);
}

#[tokio::test]
async fn arrows_move_through_list_and_enter_activates() {
    let harness = Harness::new(false);
    open_hscode(&harness).await;
    let mut list = ActiveList::new(vec!["clone", "print", "delete"]);

    let down = route_key(&harness.editor, Some(&mut list), &press(KeyCode::Down))
        .await
        .expect("down");
    assert_eq!(down, KeyOutcome::Navigated(1));

    for _ in 0..3 {
        route_key(&harness.editor, Some(&mut list), &press(KeyCode::Down))
            .await
            .expect("down");
    }
    assert_eq!(list.active(), Some(2));

    let up = route_key(&harness.editor, Some(&mut list), &press(KeyCode::Up))
        .await
        .expect("up");
    assert_eq!(up, KeyOutcome::Navigated(1));

    let enter = route_key(&harness.editor, Some(&mut list), &press(KeyCode::Enter))
        .await
        .expect("enter");
    assert_eq!(enter, KeyOutcome::Activated(1));
    assert_eq!(list.activate(), Some(&"print"));
}

#[tokio::test]
async fn list_keys_do_nothing_without_a_list() {
    let harness = Harness::new(false);
    open_hscode(&harness).await;

    for code in [KeyCode::Down, KeyCode::Up, KeyCode::Enter, KeyCode::Char('x')] {
        let outcome = route_key::<()>(&harness.editor, None, &press(code))
            .await
            .expect("route");
        assert_eq!(outcome, KeyOutcome::Unhandled);
    }
    assert!(harness.host.prompts().is_empty());
}

#[tokio::test]
async fn key_releases_are_ignored() {
    let harness = Harness::new(false);
    open_hscode(&harness).await;
    let release = KeyEvent::new_with_kind(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Release);

    let outcome = route_key::<()>(&harness.editor, None, &release)
        .await
        .expect("route");

    assert_eq!(outcome, KeyOutcome::Unhandled);
    assert!(harness.host.prompts().is_empty());
}

#[tokio::test]
async fn outside_click_goes_through_completion() {
    let harness = Harness::new(true);
    open_hscode(&harness).await;
    let hub = OutsideClickHub::new();
    let _modal = hub.subscribe();
    let mut overlay = hub.subscribe();
    hub.set_backdrop_lock(true);

    assert_eq!(hub.emit(), 1);
    assert!(overlay.recv().await.is_some());
    let outcome = harness.editor.request_completion().await.expect("completion");

    assert_eq!(
        outcome,
        CompletionOutcome::Discarded {
            missing: vec!["HSCode".to_string()]
        }
    );
    assert_eq!(harness.editor.state(), EditorState::Closed);
}
