//! Trackline - keyboard interaction layer for a project/issue tracker UI
//!
//! This crate provides keyboard shortcut matching and chord sequencing, a
//! typed event bus for opening modals, and a focus cursor for lists and
//! type-ahead pickers. Rendering and data fetching live elsewhere.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod cursor;
pub mod keymap;
pub mod modal;
pub mod replay;
pub mod route;
pub mod tracing;
pub mod typeahead;

// Re-export commonly used types
pub use config::InteractionConfig;
pub use cursor::{CursorNavigator, NavOutcome};
pub use keymap::{Binding, ChordSequencer, KeyAction, KeyEvent, Keymap, Platform};
pub use modal::{ModalEventBus, ModalHost, ModalName};
pub use route::Route;
pub use typeahead::Typeahead;
