//! Keyboard focus over a list whose contents change between renders
//!
//! Every searchable dropdown delegates arrow/Enter handling to a
//! [`CursorNavigator`]. The navigator never stores the items: each call is
//! handed the current list, so a result set replaced by a late async
//! response can never be navigated through a stale length.
//!
//! Policy is clamp-only: no wrap at either end, and a replaced list keeps
//! the previous index if it is still in range.

use crate::keymap::{Binding, BindingMatcher, KeyCode, KeyEvent};

/// What a key event did to the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved,
    Confirmed,
    /// The owning dropdown closed (Escape)
    Dismissed,
    Unhandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorNavigator {
    focused: Option<usize>,
    matcher: BindingMatcher,
    down: Binding,
    up: Binding,
    confirm: Binding,
}

impl CursorNavigator {
    pub fn new(matcher: BindingMatcher) -> Self {
        Self {
            focused: None,
            matcher,
            down: Binding::key(KeyCode::Down).focused(),
            up: Binding::key(KeyCode::Up).focused(),
            confirm: Binding::key(KeyCode::Enter).focused(),
        }
    }

    /// Index of the keyboard-focused item
    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Focused item, if the index is valid for `items`
    pub fn focused_item<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.focused.and_then(|i| items.get(i))
    }

    /// Focus an item directly (mouse hover); clamped to the list
    pub fn set_focused<T>(&mut self, items: &[T], index: usize) {
        self.focused = clamp(Some(index), items.len());
    }

    /// Re-derive focus after the list was replaced
    pub fn on_items_change<T>(&mut self, items: &[T]) {
        let before = self.focused;
        self.focused = match self.focused {
            None if !items.is_empty() => Some(0),
            focused => clamp(focused, items.len()),
        };
        if before != self.focused {
            tracing::trace!(?before, after = ?self.focused, len = items.len(), "cursor re-clamped");
        }
    }

    pub fn on_arrow_down<T>(&mut self, items: &[T]) {
        self.focused = match self.focused {
            None => clamp(Some(0), items.len()),
            Some(i) => clamp(Some(i.saturating_add(1)), items.len()),
        };
    }

    pub fn on_arrow_up<T>(&mut self, items: &[T]) {
        self.focused = match self.focused {
            None => clamp(Some(0), items.len()),
            Some(i) => clamp(Some(i.saturating_sub(1)), items.len()),
        };
    }

    /// Hand the focused item to `on_select`; no-op without focus
    ///
    /// Returns whether `on_select` ran.
    pub fn on_confirm<T, F>(&self, items: &[T], on_select: F) -> bool
    where
        F: FnOnce(&T),
    {
        match self.focused_item(items) {
            Some(item) => {
                on_select(item);
                true
            }
            None => false,
        }
    }

    /// Back to the first item, or nothing for an empty list
    pub fn on_reset<T>(&mut self, items: &[T]) {
        self.focused = if items.is_empty() { None } else { Some(0) };
    }

    /// Route a key event: ArrowDown/ArrowUp move, Enter confirms
    ///
    /// A handled event has propagation stopped and its default prevented.
    /// Enter without a focused item is left untouched.
    pub fn handle_key<T, F>(
        &mut self,
        event: &mut KeyEvent,
        items: &[T],
        on_select: F,
    ) -> NavOutcome
    where
        F: FnOnce(&T),
    {
        if !event.is_press() {
            return NavOutcome::Unhandled;
        }

        if self.matcher.matches(&self.down, event) {
            self.matcher.apply_policy(&self.down, event);
            self.on_arrow_down(items);
            NavOutcome::Moved
        } else if self.matcher.matches(&self.up, event) {
            self.matcher.apply_policy(&self.up, event);
            self.on_arrow_up(items);
            NavOutcome::Moved
        } else if self.matcher.matches(&self.confirm, event) && self.focused_item(items).is_some() {
            self.matcher.apply_policy(&self.confirm, event);
            self.on_confirm(items, on_select);
            NavOutcome::Confirmed
        } else {
            NavOutcome::Unhandled
        }
    }
}

impl Default for CursorNavigator {
    fn default() -> Self {
        Self::new(BindingMatcher::default())
    }
}

fn clamp(index: Option<usize>, len: usize) -> Option<usize> {
    match (index, len) {
        (_, 0) | (None, _) => None,
        (Some(i), len) => Some(i.min(len - 1)),
    }
}
