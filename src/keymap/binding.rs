//! Binding: a declared key + modifier combination and how it behaves on match

use super::types::{KeyCode, KeyEvent, Keystroke, Modifiers, Platform};

/// How strictly modifiers are compared
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Held modifiers must equal the declared ones exactly
    #[default]
    Strict,
    /// Declared modifiers must be held; extra ones are tolerated
    Lenient,
}

/// What to do to the original event once a binding matched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventPolicy {
    pub stop_propagation: bool,
    pub prevent_default: bool,
}

impl EventPolicy {
    /// Binding attached to a focused element: swallow the event entirely
    pub const fn focused() -> Self {
        Self {
            stop_propagation: true,
            prevent_default: true,
        }
    }

    /// Document-global binding: other listeners of the same key still see it
    pub const fn global() -> Self {
        Self {
            stop_propagation: false,
            prevent_default: true,
        }
    }

    /// Leave the event untouched
    pub const fn passive() -> Self {
        Self {
            stop_propagation: false,
            prevent_default: false,
        }
    }

    pub fn apply_to(self, event: &mut KeyEvent) {
        if self.stop_propagation {
            event.stop_propagation();
        }
        if self.prevent_default {
            event.prevent_default();
        }
    }
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self::global()
    }
}

/// A single declared key + modifier combination
///
/// Immutable once built; the builder methods consume and return `self`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Binding {
    pub stroke: Keystroke,
    pub mode: MatchMode,
    pub policy: EventPolicy,
    /// Whether the binding fires while focus is inside a text field
    pub in_text_entry: bool,
}

impl Binding {
    /// A strict, document-global binding
    pub const fn new(stroke: Keystroke) -> Self {
        Self {
            stroke,
            mode: MatchMode::Strict,
            policy: EventPolicy::global(),
            in_text_entry: false,
        }
    }

    pub const fn key(key: KeyCode) -> Self {
        Self::new(Keystroke::key(key))
    }

    pub const fn with_mods(key: KeyCode, mods: Modifiers) -> Self {
        Self::new(Keystroke::new(key, mods))
    }

    pub fn char(c: char) -> Self {
        Self::new(Keystroke::char(c))
    }

    pub const fn lenient(mut self) -> Self {
        self.mode = MatchMode::Lenient;
        self
    }

    pub const fn policy(mut self, policy: EventPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach to a focused element (stop propagation + prevent default)
    pub const fn focused(self) -> Self {
        self.policy(EventPolicy::focused())
    }

    /// Allow the binding to fire while typing in a text field
    pub const fn in_text_entry(mut self) -> Self {
        self.in_text_entry = true;
        self
    }

    /// Check whether a resolved keystroke satisfies this binding
    pub fn accepts(&self, stroke: &Keystroke) -> bool {
        if self.stroke.key != stroke.key {
            return false;
        }
        match self.mode {
            MatchMode::Strict => self.stroke.mods == stroke.mods,
            MatchMode::Lenient => stroke.mods.contains(self.stroke.mods),
        }
    }

    pub fn display_string(&self, platform: Platform) -> String {
        self.stroke.display_string(platform)
    }
}
