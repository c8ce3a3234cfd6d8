//! Default shortcuts and wiring them into a running app
//!
//! The defaults ship as keymap.yaml embedded at compile time. A user keymap
//! is merged over them, and [`install`] registers the result with a
//! [`ChordSequencer`].

use std::path::Path;
use std::rc::Rc;

use super::binding::Binding;
use super::command::{Command, CommandTarget};
use super::config::{load_keymap_file, parse_keymap_yaml, KeymapError};
use super::keymap::{Keymap, Shortcut};
use super::sequencer::{ChordSequencer, Registration};
use super::types::{KeyCode, Keystroke, Modifiers, Platform};
use crate::modal::ModalEventBus;
use crate::route::Route;

/// Default keymap YAML embedded at compile time
const DEFAULT_KEYMAP_YAML: &str = include_str!("../../keymap.yaml");

pub fn get_default_keymap_yaml() -> &'static str {
    DEFAULT_KEYMAP_YAML
}

/// Load the embedded defaults, then merge the user keymap at `user_path`
///
/// A missing or broken user file is logged and skipped.
pub fn load_default_keymap(platform: Platform, user_path: Option<&Path>) -> Keymap {
    let mut shortcuts = match parse_keymap_yaml(DEFAULT_KEYMAP_YAML, platform) {
        Ok(s) => {
            tracing::info!("Loaded embedded default keymap ({} shortcuts)", s.len());
            s
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse embedded keymap: {}, using hardcoded defaults",
                e
            );
            default_shortcuts()
        }
    };

    if let Some(user_path) = user_path {
        if user_path.exists() {
            match load_keymap_file(user_path, platform) {
                Ok(user) => {
                    tracing::info!(
                        "Merging user keymap from {} ({} shortcuts)",
                        user_path.display(),
                        user.len()
                    );
                    shortcuts = merge_shortcuts(shortcuts, user);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load user keymap from {}: {}",
                        user_path.display(),
                        e
                    );
                }
            }
        }
    }

    Keymap::new(platform, shortcuts)
}

/// Merge user shortcuts into base shortcuts
///
/// - Same key sequence → user entry replaces the base one
/// - `Unbound` → removes base entries with that key sequence
/// - Otherwise → appended
pub fn merge_shortcuts(base: Vec<Shortcut>, user: Vec<Shortcut>) -> Vec<Shortcut> {
    let mut result = base;

    for shortcut in user {
        if shortcut.command == Command::Unbound {
            result.retain(|s| s.keystrokes != shortcut.keystrokes);
            continue;
        }

        match result.iter().position(|s| s.keystrokes == shortcut.keystrokes) {
            Some(idx) => result[idx] = shortcut,
            None => result.push(shortcut),
        }
    }

    result
}

/// Hardcoded fallback, kept in sync with keymap.yaml
pub fn default_shortcuts() -> Vec<Shortcut> {
    let chord = |a: char, b: char, command| {
        Shortcut::new(vec![Keystroke::char(a), Keystroke::char(b)], command)
    };

    vec![
        chord('c', 'g', Command::OpenGoalCreate),
        chord('c', 'p', Command::OpenProjectCreate),
        chord('c', 'i', Command::OpenIssueCreate),
        Shortcut::single(
            Keystroke::new(KeyCode::Char('k'), Modifiers::PRIMARY),
            Command::OpenCommandPalette,
        ),
        chord('g', 'i', Command::GoToInbox),
        chord('g', 'g', Command::GoToGoals),
        chord('g', 'p', Command::GoToProjects),
        chord('g', 's', Command::GoToSettings),
        Shortcut::single(
            Keystroke::new(KeyCode::Char('/'), Modifiers::SHIFT),
            Command::ShowShortcutHelp,
        ),
    ]
}

/// App-side effects that shortcuts can trigger besides opening modals
#[derive(Clone)]
pub struct ShortcutHandlers {
    pub navigate: Rc<dyn Fn(Route)>,
    pub show_help: Rc<dyn Fn(bool)>,
}

impl ShortcutHandlers {
    pub fn new(navigate: impl Fn(Route) + 'static, show_help: impl Fn(bool) + 'static) -> Self {
        Self {
            navigate: Rc::new(navigate),
            show_help: Rc::new(show_help),
        }
    }
}

/// Register every shortcut of `keymap` with the sequencer
///
/// Modal commands publish an empty payload on the bus. The returned
/// registrations must be kept alive for the shortcuts to stay active.
pub fn install(
    keymap: &Keymap,
    sequencer: &ChordSequencer,
    bus: &ModalEventBus,
    handlers: &ShortcutHandlers,
) -> Result<Vec<Registration>, KeymapError> {
    let mut registrations = Vec::with_capacity(keymap.len());

    for shortcut in keymap.shortcuts() {
        let registration = match shortcut.command.target() {
            CommandTarget::None => continue,
            CommandTarget::ShortcutHelp => {
                let Some(binding) = shortcut.binding() else {
                    return Err(KeymapError::InvalidHold {
                        command: format!("{:?}", shortcut.command),
                        key: shortcut.display_string(keymap.platform()),
                    });
                };
                let show_help = Rc::clone(&handlers.show_help);
                sequencer.register_hold(binding, move |held| {
                    show_help(held);
                    Ok(())
                })
            }
            CommandTarget::Modal(name) => {
                let bus = bus.clone();
                register(sequencer, shortcut, move || {
                    name.dispatch_empty(&bus);
                    Ok(())
                })?
            }
            CommandTarget::Route(route) => {
                let navigate = Rc::clone(&handlers.navigate);
                register(sequencer, shortcut, move || {
                    navigate(route);
                    Ok(())
                })?
            }
        };
        tracing::debug!(
            command = ?shortcut.command,
            keys = %shortcut.display_string(keymap.platform()),
            "installed shortcut"
        );
        registrations.push(registration);
    }

    Ok(registrations)
}

fn register<F>(
    sequencer: &ChordSequencer,
    shortcut: &Shortcut,
    action: F,
) -> Result<Registration, KeymapError>
where
    F: FnMut() -> anyhow::Result<()> + 'static,
{
    match shortcut.binding() {
        Some(binding) => Ok(sequencer.register_binding(binding, action)),
        None => sequencer.register_chord(shortcut.keystrokes.iter().copied(), action),
    }
}

/// Binding used by the default keymap for the help overlay
pub fn help_binding() -> Binding {
    Binding::with_mods(KeyCode::Char('/'), Modifiers::SHIFT)
}
