//! Type-ahead dropdown model: query, async results and keyboard focus
//!
//! Each query change hands out a [`SearchRequest`] tagged with a generation.
//! Results are accepted only for the latest generation, so a slow response
//! to an old query can never overwrite newer results.

use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::cursor::{CursorNavigator, NavOutcome};
use crate::keymap::{Binding, BindingMatcher, KeyCode, KeyEvent};

/// A search the owner should run; hand `generation` back with the results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct Typeahead<T> {
    open: bool,
    query: String,
    generation: u64,
    loading: bool,
    items: Vec<T>,
    cursor: CursorNavigator,
    matcher: BindingMatcher,
    reveal: Binding,
    dismiss: Binding,
}

impl<T> Typeahead<T> {
    pub fn new(matcher: BindingMatcher) -> Self {
        Self {
            open: false,
            query: String::new(),
            generation: 0,
            loading: false,
            items: Vec::new(),
            cursor: CursorNavigator::new(matcher),
            matcher,
            reveal: Binding::key(KeyCode::Down).focused(),
            dismiss: Binding::key(KeyCode::Escape).focused(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn focused(&self) -> Option<usize> {
        self.cursor.focused()
    }

    pub fn focused_item(&self) -> Option<&T> {
        self.cursor.focused_item(&self.items)
    }

    /// Open the list; reopening starts from the first item again
    pub fn open(&mut self) {
        if !self.open {
            self.open = true;
            self.cursor.on_reset(&self.items);
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Record a new query and open the list
    pub fn set_query(&mut self, query: impl Into<String>) -> SearchRequest {
        self.query = query.into();
        self.generation += 1;
        self.loading = true;
        self.open();
        tracing::trace!(generation = self.generation, query = %self.query, "typeahead search");
        SearchRequest {
            generation: self.generation,
            query: self.query.clone(),
        }
    }

    /// Accept results for `generation`; stale generations are dropped
    ///
    /// Returns whether the results were applied.
    pub fn receive_results(&mut self, generation: u64, items: Vec<T>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                latest = self.generation,
                "dropping stale typeahead results"
            );
            return false;
        }
        self.loading = false;
        self.set_items(items);
        true
    }

    /// Replace the list wholesale (static options, or already-filtered results)
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.cursor.on_items_change(&self.items);
    }

    /// Arrow keys move, Enter confirms and closes, Escape closes
    ///
    /// ArrowDown on a closed list opens it.
    pub fn handle_key<F>(&mut self, event: &mut KeyEvent, on_select: F) -> NavOutcome
    where
        F: FnOnce(&T),
    {
        if !event.is_press() {
            return NavOutcome::Unhandled;
        }

        if !self.open {
            if self.matcher.consume(&self.reveal, event) {
                self.open();
                return NavOutcome::Moved;
            }
            return NavOutcome::Unhandled;
        }

        if self.matcher.consume(&self.dismiss, event) {
            self.close();
            return NavOutcome::Dismissed;
        }

        let outcome = self.cursor.handle_key(event, &self.items, on_select);
        if outcome == NavOutcome::Confirmed {
            self.close();
        }
        outcome
    }
}

impl<T> Default for Typeahead<T> {
    fn default() -> Self {
        Self::new(BindingMatcher::default())
    }
}

/// Fuzzy-filter `items` by `query`, best matches first
///
/// An empty query keeps every item in its original order. Equal scores keep
/// their original relative order.
pub fn fuzzy_filter<'a, T, K>(items: &'a [T], query: &str, key: K) -> Vec<&'a T>
where
    K: Fn(&T) -> &str,
{
    let query = query.trim();
    if query.is_empty() {
        return items.iter().collect();
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let needle_text = query.to_lowercase();
    let mut needle_buf = Vec::new();
    let needle = Utf32Str::new(&needle_text, &mut needle_buf);

    let mut haystack_buf = Vec::new();
    let mut scored: Vec<(u16, usize)> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let haystack = Utf32Str::new(key(item), &mut haystack_buf);
            matcher
                .fuzzy_match(haystack, needle)
                .map(|score| (score, idx))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, idx)| &items[idx]).collect()
}
