//! Keymap: the set of global shortcuts and lookups over it

use super::binding::Binding;
use super::command::Command;
use super::types::{Keystroke, Platform};

/// A key sequence bound to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    /// One keystroke for a plain binding, several for a chord
    pub keystrokes: Vec<Keystroke>,
    pub command: Command,
}

impl Shortcut {
    pub fn new(keystrokes: Vec<Keystroke>, command: Command) -> Self {
        Self {
            keystrokes,
            command,
        }
    }

    pub fn single(keystroke: Keystroke, command: Command) -> Self {
        Self::new(vec![keystroke], command)
    }

    pub fn is_chord(&self) -> bool {
        self.keystrokes.len() > 1
    }

    /// Binding for a single-keystroke shortcut
    pub fn binding(&self) -> Option<Binding> {
        match self.keystrokes.as_slice() {
            [stroke] => Some(Binding::new(*stroke)),
            _ => None,
        }
    }

    /// Display string for the shortcut (e.g., "⌘K" or "C G")
    pub fn display_string(&self, platform: Platform) -> String {
        self.keystrokes
            .iter()
            .map(|k| k.display_string(platform))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// All shortcuts for one platform, in declaration order
#[derive(Debug, Clone)]
pub struct Keymap {
    platform: Platform,
    shortcuts: Vec<Shortcut>,
}

impl Keymap {
    pub fn new(platform: Platform, shortcuts: Vec<Shortcut>) -> Self {
        Self {
            platform,
            shortcuts,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    /// Get the shortcut for a command (first match)
    pub fn shortcut_for(&self, command: Command) -> Option<&Shortcut> {
        self.shortcuts.iter().find(|s| s.command == command)
    }

    /// Get display string for a command's shortcut
    pub fn display_for(&self, command: Command) -> Option<String> {
        self.shortcut_for(command)
            .map(|s| s.display_string(self.platform))
    }

    /// Rows for the shortcut help overlay: (command name, keys)
    pub fn cheat_sheet(&self) -> Vec<(&'static str, String)> {
        self.shortcuts
            .iter()
            .filter(|s| s.command != Command::Unbound)
            .map(|s| (s.command.display_name(), s.display_string(self.platform)))
            .collect()
    }
}
