//! Platform-aware keyboard shortcuts
//!
//! This module provides:
//! - Pure matching of key events against declared bindings, with modifier
//!   roles (Cmd on macOS, Ctrl elsewhere)
//! - A dispatcher for single bindings, timed chords (`c` then `g`) and
//!   hold-to-show keys, with RAII registrations
//! - YAML keymaps (embedded defaults plus a user file)
//!
//! # Architecture
//!
//! ```text
//! KeyboardEvent.code → KeyEvent → ChordSequencer → BindingMatcher → action
//!                                                                  ├─ ModalEventBus::publish
//!                                                                  └─ navigate(Route)
//! ```

mod binding;
mod code_adapter;
mod command;
mod config;
mod defaults;
#[allow(clippy::module_inception)]
mod keymap;
mod matcher;
mod sequencer;
mod types;

pub use binding::{Binding, EventPolicy, MatchMode};
pub use code_adapter::{key_code_from_code, key_event_from_code};
pub use command::{Command, CommandTarget};
pub use config::{
    load_keymap_file, parse_key_sequence, parse_key_string, parse_keymap_yaml, KeymapError,
};
pub use defaults::{
    default_shortcuts, get_default_keymap_yaml, help_binding, install, load_default_keymap,
    merge_shortcuts, ShortcutHandlers,
};
pub use keymap::{Keymap, Shortcut};
pub use matcher::BindingMatcher;
pub use sequencer::{
    ChordSequencer, KeyAction, Registration, RegistrationId, DEFAULT_CHORD_TIMEOUT,
};
pub use types::{
    FocusOrigin, KeyCode, KeyEvent, KeyEventKind, Keystroke, Modifiers, PhysicalModifiers,
    Platform,
};
