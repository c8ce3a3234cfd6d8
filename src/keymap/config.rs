//! YAML configuration parsing for keymaps
//!
//! Parses keymap.yaml files into [`Shortcut`]s. A key field is one or more
//! space-separated keystrokes (`"c g"` is a chord), each written as
//! `+`-joined modifiers and a key (`"cmd+shift+k"`).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use super::command::Command;
use super::keymap::Shortcut;
use super::types::{KeyCode, Keystroke, Modifiers, Platform};

/// Root structure of a keymap YAML file
#[derive(Debug, Deserialize)]
pub struct KeymapConfig {
    pub bindings: Vec<BindingConfig>,
}

/// A single binding entry from YAML
#[derive(Debug, Deserialize)]
pub struct BindingConfig {
    pub key: String,
    pub command: String,
    /// Restrict the entry to one platform (`macos`, `linux`, `windows`)
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Errors that can occur when loading keymaps or registering keys
#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("failed to read keymap {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid keymap file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("no key found in binding: {0}")]
    MissingKey(String),
    #[error("key sequence is empty")]
    EmptySequence,
    #[error("unknown command: {0}")]
    InvalidCommand(String),
    #[error("hold command {command} needs a single keystroke, got {key:?}")]
    InvalidHold { command: String, key: String },
}

/// Load shortcuts from a YAML file
pub fn load_keymap_file(path: &Path, platform: Platform) -> Result<Vec<Shortcut>, KeymapError> {
    let content = std::fs::read_to_string(path).map_err(|source| KeymapError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_keymap_yaml(&content, platform)
}

/// Parse shortcuts from a YAML string, keeping entries for `platform`
pub fn parse_keymap_yaml(yaml: &str, platform: Platform) -> Result<Vec<Shortcut>, KeymapError> {
    let config: KeymapConfig = serde_yaml::from_str(yaml)?;
    let mut shortcuts = Vec::with_capacity(config.bindings.len());

    for entry in config.bindings {
        if entry.platform.is_some_and(|p| p != platform) {
            continue;
        }

        let keystrokes = parse_key_sequence(&entry.key, platform)?;
        let command = Command::from_str(&entry.command)
            .map_err(|_| KeymapError::InvalidCommand(entry.command.clone()))?;

        if command.is_hold() && keystrokes.len() != 1 {
            return Err(KeymapError::InvalidHold {
                command: entry.command,
                key: entry.key,
            });
        }

        shortcuts.push(Shortcut::new(keystrokes, command));
    }

    Ok(shortcuts)
}

/// Parse a space-separated key sequence like `"c g"` or `"cmd+k"`
pub fn parse_key_sequence(
    sequence: &str,
    platform: Platform,
) -> Result<Vec<Keystroke>, KeymapError> {
    let keystrokes = sequence
        .split_whitespace()
        .map(|part| parse_key_string(part, platform))
        .collect::<Result<Vec<_>, _>>()?;
    if keystrokes.is_empty() {
        return Err(KeymapError::EmptySequence);
    }
    Ok(keystrokes)
}

/// Parse a key string like "cmd+shift+s" into a Keystroke
///
/// `cmd`/`primary` and `secondary` are roles. The physical names `ctrl` and
/// `meta` are mapped onto roles for `platform`, so `ctrl+k` in a Linux
/// keymap means the same binding as `cmd+k`.
pub fn parse_key_string(key_str: &str, platform: Platform) -> Result<Keystroke, KeymapError> {
    let (ctrl_role, meta_role) = match platform {
        Platform::Mac => (Modifiers::SECONDARY, Modifiers::PRIMARY),
        Platform::Other => (Modifiers::PRIMARY, Modifiers::SECONDARY),
    };

    let mut mods = Modifiers::NONE;
    let mut key_part = None;

    for part in key_str.split('+') {
        let part_lower = part.trim().to_lowercase();
        match part_lower.as_str() {
            "cmd" | "command" | "primary" | "mod" => mods = mods | Modifiers::PRIMARY,
            "secondary" => mods = mods | Modifiers::SECONDARY,
            "ctrl" | "control" => mods = mods | ctrl_role,
            "meta" | "super" | "win" => mods = mods | meta_role,
            "shift" => mods = mods | Modifiers::SHIFT,
            "alt" | "option" | "opt" => mods = mods | Modifiers::ALT,
            "" => return Err(KeymapError::InvalidKey(key_str.to_string())),
            _ => {
                if key_part.is_some() {
                    return Err(KeymapError::InvalidKey(format!(
                        "multiple keys in binding: {}",
                        key_str
                    )));
                }
                key_part = Some(parse_key_code(&part_lower)?);
            }
        }
    }

    let key = key_part.ok_or_else(|| KeymapError::MissingKey(key_str.to_string()))?;

    Ok(Keystroke::new(key, mods))
}

/// Parse a key code from string
fn parse_key_code(key: &str) -> Result<KeyCode, KeymapError> {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c.to_ascii_lowercase()));
    }

    match key {
        "enter" | "return" => Ok(KeyCode::Enter),
        "escape" | "esc" => Ok(KeyCode::Escape),
        "tab" => Ok(KeyCode::Tab),
        "backspace" | "back" => Ok(KeyCode::Backspace),
        "delete" | "del" => Ok(KeyCode::Delete),
        "space" => Ok(KeyCode::Space),
        "plus" => Ok(KeyCode::Char('+')),

        "up" | "arrowup" => Ok(KeyCode::Up),
        "down" | "arrowdown" => Ok(KeyCode::Down),
        "left" | "arrowleft" => Ok(KeyCode::Left),
        "right" | "arrowright" => Ok(KeyCode::Right),

        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdown" | "pgdn" => Ok(KeyCode::PageDown),

        _ => match key.strip_prefix('f').map(str::parse::<u8>) {
            Some(Ok(n @ 1..=24)) => Ok(KeyCode::F(n)),
            _ => Err(KeymapError::InvalidKey(format!("unknown key: {}", key))),
        },
    }
}
