//! Adapter from W3C `KeyboardEvent.code` values to our key types
//!
//! `code` names the physical key, independent of layout and of Shift, so
//! `shift+/` arrives as `"Slash"` and not as `"?"`.

use super::types::{KeyCode, KeyEvent, PhysicalModifiers};

/// Convert a `KeyboardEvent.code` string to a [`KeyCode`]
///
/// Returns None for keys we never bind (modifiers themselves, media keys).
pub fn key_code_from_code(code: &str) -> Option<KeyCode> {
    if let Some(letter) = code.strip_prefix("Key") {
        let mut chars = letter.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Some(KeyCode::Char(c.to_ascii_lowercase()))
            }
            _ => None,
        };
    }
    if let Some(digit) = code.strip_prefix("Digit") {
        let mut chars = digit.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => Some(KeyCode::Char(c)),
            _ => None,
        };
    }
    if let Some(n) = code.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        return (1..=24).contains(&n).then_some(KeyCode::F(n));
    }

    let key = match code {
        "Enter" | "NumpadEnter" => KeyCode::Enter,
        "Escape" => KeyCode::Escape,
        "Tab" => KeyCode::Tab,
        "Backspace" => KeyCode::Backspace,
        "Delete" => KeyCode::Delete,
        "Space" => KeyCode::Space,

        "ArrowUp" => KeyCode::Up,
        "ArrowDown" => KeyCode::Down,
        "ArrowLeft" => KeyCode::Left,
        "ArrowRight" => KeyCode::Right,

        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,

        // Punctuation, named after the unshifted US layout character
        "Slash" => KeyCode::Char('/'),
        "Backslash" => KeyCode::Char('\\'),
        "Period" => KeyCode::Char('.'),
        "Comma" => KeyCode::Char(','),
        "Semicolon" => KeyCode::Char(';'),
        "Quote" => KeyCode::Char('\''),
        "Backquote" => KeyCode::Char('`'),
        "Minus" => KeyCode::Char('-'),
        "Equal" => KeyCode::Char('='),
        "BracketLeft" => KeyCode::Char('['),
        "BracketRight" => KeyCode::Char(']'),

        _ => return None,
    };
    Some(key)
}

/// Build a key event from raw DOM-style fields
pub fn key_event_from_code(
    code: &str,
    ctrl: bool,
    shift: bool,
    alt: bool,
    meta: bool,
) -> Option<KeyEvent> {
    let key = key_code_from_code(code)?;
    Some(KeyEvent::new(key).with_mods(PhysicalModifiers::new(ctrl, shift, alt, meta)))
}
