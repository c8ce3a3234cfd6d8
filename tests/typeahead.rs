//! Cursor and type-ahead tests
//!
//! Tests for keyboard focus in option lists: clamping, async results and
//! confirmation.

mod common;

use std::rc::Rc;

use common::recorder;

use trackline::cursor::{CursorNavigator, NavOutcome};
use trackline::keymap::{BindingMatcher, FocusOrigin, KeyCode, KeyEvent, Platform};
use trackline::typeahead::{fuzzy_filter, Typeahead};

fn matcher() -> BindingMatcher {
    BindingMatcher::new(Platform::Other)
}

fn key(code: KeyCode) -> KeyEvent {
    // Dropdown inputs are text fields
    KeyEvent::new(code).with_origin(FocusOrigin::TextEntry)
}

// ========================================================================
// End-to-end
// ========================================================================

#[test]
fn test_async_results_then_arrows_then_enter() {
    let mut dropdown: Typeahead<String> = Typeahead::new(matcher());
    dropdown.open();
    assert_eq!(dropdown.focused(), None);

    let request = dropdown.set_query("plat");
    assert!(dropdown.is_loading());
    assert!(dropdown.receive_results(
        request.generation,
        vec!["Platform".into(), "Platform API".into(), "Platform Web".into()],
    ));
    assert_eq!(dropdown.focused(), Some(0));

    for _ in 0..2 {
        assert_eq!(
            dropdown.handle_key(&mut key(KeyCode::Down), |_| {}),
            NavOutcome::Moved
        );
    }
    assert_eq!(dropdown.focused(), Some(2));

    let confirmed = recorder();
    let c = Rc::clone(&confirmed);
    let mut enter = key(KeyCode::Enter);
    let outcome = dropdown.handle_key(&mut enter, move |item: &String| {
        c.borrow_mut().push(item.clone())
    });

    assert_eq!(outcome, NavOutcome::Confirmed);
    assert_eq!(*confirmed.borrow(), vec!["Platform Web".to_string()]);
    assert!(enter.default_prevented());
    assert!(!dropdown.is_open());
}

#[test]
fn test_slow_response_for_old_query_is_ignored() {
    let mut dropdown: Typeahead<&str> = Typeahead::new(matcher());
    let first = dropdown.set_query("b");
    let second = dropdown.set_query("bi");

    assert!(dropdown.receive_results(second.generation, vec!["Billing"]));
    assert!(!dropdown.receive_results(first.generation, vec!["Backend", "Billing", "Bugs"]));
    assert_eq!(dropdown.items(), ["Billing"]);
    assert!(!dropdown.is_loading());
}

#[test]
fn test_escape_dismisses_and_down_reopens() {
    let mut dropdown: Typeahead<&str> = Typeahead::new(matcher());
    dropdown.set_items(vec!["Inbox", "Issues"]);
    dropdown.open();
    dropdown.handle_key(&mut key(KeyCode::Down), |_| {});
    assert_eq!(dropdown.focused(), Some(1));

    assert_eq!(
        dropdown.handle_key(&mut key(KeyCode::Escape), |_| {}),
        NavOutcome::Dismissed
    );
    assert!(!dropdown.is_open());

    assert_eq!(
        dropdown.handle_key(&mut key(KeyCode::Down), |_| {}),
        NavOutcome::Moved
    );
    assert!(dropdown.is_open());
    assert_eq!(dropdown.focused(), Some(0));
}

// ========================================================================
// CursorNavigator
// ========================================================================

#[test]
fn test_shrinking_list_clamps_focus() {
    let mut nav = CursorNavigator::new(matcher());
    let items = ["a", "b", "c", "d", "e"];
    nav.on_items_change(&items);
    nav.set_focused(&items, 4);

    nav.on_items_change(&items[..2]);
    assert_eq!(nav.focused(), Some(1));

    nav.on_items_change::<&str>(&[]);
    assert_eq!(nav.focused(), None);
}

#[test]
fn test_growing_list_keeps_index() {
    let mut nav = CursorNavigator::new(matcher());
    let items = ["a", "b", "c", "d"];
    nav.on_items_change(&items[..2]);
    nav.on_arrow_down(&items[..2]);
    assert_eq!(nav.focused(), Some(1));

    nav.on_items_change(&items);
    assert_eq!(nav.focused(), Some(1));
}

#[test]
fn test_arrows_stop_at_edges() {
    let mut nav = CursorNavigator::new(matcher());
    let items = [1, 2, 3];
    nav.on_items_change(&items);

    nav.on_arrow_up(&items);
    assert_eq!(nav.focused(), Some(0));
    for _ in 0..10 {
        nav.on_arrow_down(&items);
    }
    assert_eq!(nav.focused(), Some(2));
}

#[test]
fn test_enter_without_focus_passes_through() {
    let mut nav = CursorNavigator::new(matcher());
    let items: [&str; 0] = [];
    let mut enter = key(KeyCode::Enter);

    let outcome = nav.handle_key(&mut enter, &items, |_| panic!("nothing to select"));
    assert_eq!(outcome, NavOutcome::Unhandled);
    assert!(!enter.default_prevented());
    assert!(!enter.propagation_stopped());
}

// ========================================================================
// Filtering
// ========================================================================

#[test]
fn test_fuzzy_filter_ranks_matches() {
    let projects = ["Mobile app", "Billing", "Bill of materials", "Infra"];
    let hits = fuzzy_filter(&projects, "bill", |s| *s);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|p| p.to_lowercase().contains("bill")));

    assert_eq!(fuzzy_filter(&projects, "  ", |s| *s).len(), projects.len());
}
