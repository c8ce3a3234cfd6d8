//! Core types for the keymap system: Platform, Modifiers, KeyCode, Keystroke, KeyEvent

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Host platform, which decides what the "primary" modifier is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Primary modifier is Cmd, secondary is Ctrl
    #[serde(alias = "macos")]
    Mac,
    /// Primary modifier is Ctrl, secondary is the logo key (Win/Super)
    #[serde(alias = "linux", alias = "windows")]
    Other,
}

static CURRENT_PLATFORM: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Detect the platform from the build target
    pub const fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    /// The platform for this process, resolved once
    ///
    /// The first call to [`Platform::install`] or [`Platform::current`] wins.
    pub fn current() -> Self {
        *CURRENT_PLATFORM.get_or_init(Self::detect)
    }

    /// Pin the process-wide platform (e.g. from a config override)
    ///
    /// Returns the platform actually in effect, which differs from `platform`
    /// if it had already been resolved.
    pub fn install(platform: Platform) -> Self {
        *CURRENT_PLATFORM.get_or_init(|| platform)
    }

    /// Resolve physical modifier flags into platform-independent roles
    pub const fn resolve(self, physical: PhysicalModifiers) -> Modifiers {
        let (primary, secondary) = match self {
            Platform::Mac => (physical.meta, physical.ctrl),
            Platform::Other => (physical.ctrl, physical.meta),
        };
        Modifiers::new(primary, physical.shift, physical.alt, secondary)
    }
}

/// Modifier roles as a bitfield for efficient storage and comparison
///
/// Roles are platform-independent: `PRIMARY` is Cmd on macOS and Ctrl
/// elsewhere, `SECONDARY` is the remaining control-like key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PRIMARY: Modifiers = Modifiers(0b0001);
    pub const SHIFT: Modifiers = Modifiers(0b0010);
    pub const ALT: Modifiers = Modifiers(0b0100);
    pub const SECONDARY: Modifiers = Modifiers(0b1000);

    /// Create modifiers from individual role flags
    pub const fn new(primary: bool, shift: bool, alt: bool, secondary: bool) -> Self {
        let mut bits = 0u8;
        if primary {
            bits |= 0b0001;
        }
        if shift {
            bits |= 0b0010;
        }
        if alt {
            bits |= 0b0100;
        }
        if secondary {
            bits |= 0b1000;
        }
        Modifiers(bits)
    }

    #[inline]
    pub const fn primary(self) -> bool {
        self.0 & 0b0001 != 0
    }

    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & 0b0010 != 0
    }

    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & 0b0100 != 0
    }

    #[inline]
    pub const fn secondary(self) -> bool {
        self.0 & 0b1000 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine two modifier sets
    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Check if this contains all modifiers in other
    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.primary() {
            parts.push("Primary");
        }
        if self.shift() {
            parts.push("Shift");
        }
        if self.alt() {
            parts.push("Alt");
        }
        if self.secondary() {
            parts.push("Secondary");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// Physical modifier keys as reported by the event source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PhysicalModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Cmd on macOS, Win/Super elsewhere
    pub meta: bool,
}

impl PhysicalModifiers {
    pub const NONE: PhysicalModifiers = PhysicalModifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const fn new(ctrl: bool, shift: bool, alt: bool, meta: bool) -> Self {
        Self {
            ctrl,
            shift,
            alt,
            meta,
        }
    }

    /// Physical flags that produce `roles` on `platform`
    pub const fn from_roles(roles: Modifiers, platform: Platform) -> Self {
        let (ctrl, meta) = match platform {
            Platform::Mac => (roles.secondary(), roles.primary()),
            Platform::Other => (roles.primary(), roles.secondary()),
        };
        Self::new(ctrl, roles.shift(), roles.alt(), meta)
    }
}

/// A platform-independent physical key code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key (normalized to lowercase)
    Char(char),

    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,

    Up,
    Down,
    Left,
    Right,

    Home,
    End,
    PageUp,
    PageDown,

    /// F1-F24
    F(u8),
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{}", c.to_uppercase()),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Escape => write!(f, "Escape"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Delete => write!(f, "Delete"),
            KeyCode::Space => write!(f, "Space"),
            KeyCode::Up => write!(f, "↑"),
            KeyCode::Down => write!(f, "↓"),
            KeyCode::Left => write!(f, "←"),
            KeyCode::Right => write!(f, "→"),
            KeyCode::Home => write!(f, "Home"),
            KeyCode::End => write!(f, "End"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            KeyCode::F(n) => write!(f, "F{}", n),
        }
    }
}

/// A single keystroke: a key with modifier roles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub key: KeyCode,
    pub mods: Modifiers,
}

impl Keystroke {
    pub const fn new(key: KeyCode, mods: Modifiers) -> Self {
        Self { key, mods }
    }

    /// Create a keystroke with no modifiers
    pub const fn key(key: KeyCode) -> Self {
        Self {
            key,
            mods: Modifiers::NONE,
        }
    }

    /// Create a keystroke with a character key
    pub fn char(c: char) -> Self {
        Self {
            key: KeyCode::Char(c.to_ascii_lowercase()),
            mods: Modifiers::NONE,
        }
    }

    /// Create a keystroke with a character and modifiers
    pub fn char_with_mods(c: char, mods: Modifiers) -> Self {
        Self {
            key: KeyCode::Char(c.to_ascii_lowercase()),
            mods,
        }
    }

    /// Display the keystroke using the platform's conventions
    pub fn display_string(&self, platform: Platform) -> String {
        let mut parts = Vec::new();

        match platform {
            Platform::Mac => {
                // macOS uses symbols: ⌃ ⌥ ⇧ ⌘
                if self.mods.secondary() {
                    parts.push("⌃");
                }
                if self.mods.alt() {
                    parts.push("⌥");
                }
                if self.mods.shift() {
                    parts.push("⇧");
                }
                if self.mods.primary() {
                    parts.push("⌘");
                }
            }
            Platform::Other => {
                if self.mods.primary() {
                    parts.push("Ctrl+");
                }
                if self.mods.alt() {
                    parts.push("Alt+");
                }
                if self.mods.shift() {
                    parts.push("Shift+");
                }
                if self.mods.secondary() {
                    parts.push("Win+");
                }
            }
        }

        format!("{}{}", parts.join(""), self.key)
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.mods.is_empty() {
            write!(f, "{}+{}", self.mods, self.key)
        } else {
            write!(f, "{}", self.key)
        }
    }
}

/// Press or release
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    #[default]
    Press,
    Release,
}

/// Where keyboard focus was when the event originated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FocusOrigin {
    /// A text input, textarea or contenteditable element
    TextEntry,
    #[default]
    Other,
}

/// A captured keyboard event
///
/// Handlers signal to the surrounding event system through
/// [`KeyEvent::stop_propagation`] and [`KeyEvent::prevent_default`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub mods: PhysicalModifiers,
    pub kind: KeyEventKind,
    pub origin: FocusOrigin,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl KeyEvent {
    /// A key press with no modifiers, outside any text field
    pub const fn new(key: KeyCode) -> Self {
        Self {
            key,
            mods: PhysicalModifiers::NONE,
            kind: KeyEventKind::Press,
            origin: FocusOrigin::Other,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c.to_ascii_lowercase()))
    }

    pub const fn with_mods(mut self, mods: PhysicalModifiers) -> Self {
        self.mods = mods;
        self
    }

    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    pub const fn with_origin(mut self, origin: FocusOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Same key, released
    pub fn released(&self) -> Self {
        Self::new(self.key)
            .with_mods(self.mods)
            .with_origin(self.origin)
            .with_kind(KeyEventKind::Release)
    }

    #[inline]
    pub fn is_press(&self) -> bool {
        self.kind == KeyEventKind::Press
    }

    #[inline]
    pub fn in_text_entry(&self) -> bool {
        self.origin == FocusOrigin::TextEntry
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
