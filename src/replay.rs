//! Scripted key replay through the full shortcut pipeline
//!
//! A script is line based; `#` starts a comment.
//!
//! ```text
//! c g              # press keys, `gap` ms apart
//! wait 900         # advance the clock
//! focus text       # following keys come from a text field (`focus other` to leave)
//! hold shift+/     # press without release
//! release shift+/
//! publish GoalCreateModal
//! close GoalCreateModal
//! ```
//!
//! Every modal gets a mounted host and every default shortcut is installed,
//! so the transcript shows what a user would see.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::keymap::{
    install, parse_key_string, BindingMatcher, ChordSequencer, FocusOrigin, KeyAction, KeyEvent,
    KeyEventKind, Keymap, KeymapError, PhysicalModifiers, Platform, Registration,
    ShortcutHandlers,
};
use crate::modal::{
    Channel, CommandPaletteModal, GoalCreateModal, GoalDeleteModal, IssueCreateModal, ModalEventBus,
    ModalHost, ModalName, ProjectCreateModal,
};
use crate::route::Route;

/// Default pause between keys typed on one script line
pub const DEFAULT_KEY_GAP: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: {source}")]
    Key {
        line: usize,
        #[source]
        source: KeymapError,
    },
    #[error("line {line}: unknown modal {name:?}")]
    UnknownModal { line: usize, name: String },
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error(transparent)]
    Setup(#[from] KeymapError),
}

/// One observable effect, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Key {
        at_ms: u64,
        key: String,
        outcome: KeyOutcome,
    },
    ModalShown {
        modal: String,
    },
    ModalClosed {
        modal: String,
    },
    Navigated {
        route: Route,
    },
    ShortcutHelp {
        visible: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOutcome {
    Handled,
    AwaitMore,
    NoMatch,
}

impl From<KeyAction> for KeyOutcome {
    fn from(action: KeyAction) -> Self {
        match action {
            KeyAction::Handled(_) => KeyOutcome::Handled,
            KeyAction::AwaitMore => KeyOutcome::AwaitMore,
            KeyAction::NoMatch => KeyOutcome::NoMatch,
        }
    }
}

type Log = Rc<RefCell<Vec<ReplayEvent>>>;

struct Hosts {
    goal_create: ModalHost<GoalCreateModal>,
    project_create: ModalHost<ProjectCreateModal>,
    issue_create: ModalHost<IssueCreateModal>,
    goal_delete: ModalHost<GoalDeleteModal>,
    command_palette: ModalHost<CommandPaletteModal>,
}

impl Hosts {
    fn mount(
        bus: &ModalEventBus,
        sequencer: &ChordSequencer,
        log: &Log,
    ) -> Result<Self, KeymapError> {
        Ok(Self {
            goal_create: logged_host(bus, sequencer, log)?,
            project_create: logged_host(bus, sequencer, log)?,
            issue_create: logged_host(bus, sequencer, log)?,
            goal_delete: logged_host(bus, sequencer, log)?,
            command_palette: logged_host(bus, sequencer, log)?,
        })
    }

    fn close(&self, name: ModalName) -> bool {
        match name {
            ModalName::GoalCreate => self.goal_create.close(),
            ModalName::ProjectCreate => self.project_create.close(),
            ModalName::IssueCreate => self.issue_create.close(),
            ModalName::GoalDelete => self.goal_delete.close(),
            ModalName::CommandPalette => self.command_palette.close(),
        }
    }

    fn visible(&self) -> Vec<ModalName> {
        [
            (ModalName::GoalCreate, self.goal_create.is_visible()),
            (ModalName::ProjectCreate, self.project_create.is_visible()),
            (ModalName::IssueCreate, self.issue_create.is_visible()),
            (ModalName::GoalDelete, self.goal_delete.is_visible()),
            (ModalName::CommandPalette, self.command_palette.is_visible()),
        ]
        .into_iter()
        .filter_map(|(name, visible)| visible.then_some(name))
        .collect()
    }
}

fn logged_host<C: Channel>(
    bus: &ModalEventBus,
    sequencer: &ChordSequencer,
    log: &Log,
) -> Result<ModalHost<C>, KeymapError> {
    let (shown, closed) = (Rc::clone(log), Rc::clone(log));
    ModalHost::<C>::builder()
        .on_show(move |_| {
            shown.borrow_mut().push(ReplayEvent::ModalShown {
                modal: C::NAME.to_string(),
            });
            Ok(())
        })
        .on_close(move || {
            closed.borrow_mut().push(ReplayEvent::ModalClosed {
                modal: C::NAME.to_string(),
            });
            Ok(())
        })
        .mount(bus, sequencer)
}

/// A live shortcut pipeline driven by a virtual clock
pub struct Replayer {
    platform: Platform,
    sequencer: ChordSequencer,
    bus: ModalEventBus,
    hosts: Hosts,
    log: Log,
    start: Instant,
    elapsed: Duration,
    gap: Duration,
    origin: FocusOrigin,
    _shortcuts: Vec<Registration>,
}

impl Replayer {
    pub fn new(keymap: &Keymap, timeout: Duration) -> Result<Self, ReplayError> {
        let platform = keymap.platform();
        let sequencer = ChordSequencer::with_timeout(BindingMatcher::new(platform), timeout);
        let bus = ModalEventBus::new();
        let log: Log = Rc::new(RefCell::new(Vec::new()));

        let hosts = Hosts::mount(&bus, &sequencer, &log)?;

        let (nav_log, help_log) = (Rc::clone(&log), Rc::clone(&log));
        let handlers = ShortcutHandlers::new(
            move |route| nav_log.borrow_mut().push(ReplayEvent::Navigated { route }),
            move |visible| {
                help_log
                    .borrow_mut()
                    .push(ReplayEvent::ShortcutHelp { visible })
            },
        );
        let shortcuts = install(keymap, &sequencer, &bus, &handlers)?;

        Ok(Self {
            platform,
            sequencer,
            bus,
            hosts,
            log,
            start: Instant::now(),
            elapsed: Duration::ZERO,
            gap: DEFAULT_KEY_GAP,
            origin: FocusOrigin::Other,
            _shortcuts: shortcuts,
        })
    }

    pub fn set_key_gap(&mut self, gap: Duration) {
        self.gap = gap;
    }

    pub fn advance(&mut self, by: Duration) {
        self.elapsed += by;
    }

    /// Modals currently open
    pub fn visible_modals(&self) -> Vec<ModalName> {
        self.hosts.visible()
    }

    pub fn pending_chord(&self) -> Option<String> {
        self.sequencer.pending_display()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<ReplayEvent> {
        self.log.borrow().clone()
    }

    /// Send one key string (`"cmd+k"`) through the pipeline
    pub fn key(&mut self, key: &str, kind: KeyEventKind) -> Result<KeyAction, KeymapError> {
        let stroke = parse_key_string(key, self.platform)?;
        let mut event = KeyEvent::new(stroke.key)
            .with_mods(PhysicalModifiers::from_roles(stroke.mods, self.platform))
            .with_kind(kind)
            .with_origin(self.origin);

        // Effects are logged during dispatch; the key itself goes before them
        let mark = self.log.borrow().len();
        let action = self
            .sequencer
            .handle_key(&mut event, self.start + self.elapsed);

        self.log.borrow_mut().insert(
            mark,
            ReplayEvent::Key {
                at_ms: self.elapsed.as_millis() as u64,
                key: stroke.display_string(self.platform),
                outcome: action.into(),
            },
        );
        Ok(action)
    }

    /// Run a whole script
    pub fn run(&mut self, script: &str) -> Result<(), ReplayError> {
        for (idx, raw) in script.lines().enumerate() {
            let line = idx + 1;
            let text = raw.split('#').next().unwrap_or_default().trim();
            let mut words = text.split_whitespace();
            let Some(first) = words.next() else {
                continue;
            };
            let rest: Vec<&str> = words.collect();

            match first {
                "wait" => {
                    let ms = single(&rest, line, "wait <ms>")?
                        .parse::<u64>()
                        .map_err(|e| ReplayError::Syntax {
                            line,
                            message: format!("bad duration: {}", e),
                        })?;
                    self.advance(Duration::from_millis(ms));
                }
                "focus" => {
                    self.origin = match single(&rest, line, "focus text|other")? {
                        "text" => FocusOrigin::TextEntry,
                        "other" => FocusOrigin::Other,
                        other => {
                            return Err(ReplayError::Syntax {
                                line,
                                message: format!("unknown focus target {:?}", other),
                            })
                        }
                    };
                }
                "hold" | "release" => {
                    let key = single(&rest, line, "hold|release <key>")?;
                    let kind = if first == "hold" {
                        KeyEventKind::Press
                    } else {
                        KeyEventKind::Release
                    };
                    self.key(key, kind)
                        .map_err(|source| ReplayError::Key { line, source })?;
                }
                "publish" | "close" => {
                    let name = single(&rest, line, "publish|close <modal>")?;
                    let modal: ModalName =
                        name.parse().map_err(|_| ReplayError::UnknownModal {
                            line,
                            name: name.to_string(),
                        })?;
                    if first == "publish" {
                        modal.dispatch_empty(&self.bus);
                    } else {
                        self.hosts.close(modal);
                    }
                }
                _ => {
                    for (i, key) in std::iter::once(first).chain(rest).enumerate() {
                        if i > 0 {
                            self.advance(self.gap);
                        }
                        self.key(key, KeyEventKind::Press)
                            .map_err(|source| ReplayError::Key { line, source })?;
                    }
                    self.advance(self.gap);
                }
            }
        }
        Ok(())
    }
}

fn single<'a>(args: &[&'a str], line: usize, usage: &str) -> Result<&'a str, ReplayError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(ReplayError::Syntax {
            line,
            message: format!("usage: {}", usage),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::load_default_keymap;

    fn replayer() -> Replayer {
        let keymap = load_default_keymap(Platform::Other, None);
        Replayer::new(&keymap, Duration::from_millis(800)).unwrap()
    }

    fn shown(name: &str) -> ReplayEvent {
        ReplayEvent::ModalShown {
            modal: name.to_string(),
        }
    }

    #[test]
    fn test_chord_opens_modal_and_escape_closes_it() {
        let mut r = replayer();
        r.run("c g\nescape").unwrap();

        let events = r.events();
        assert_eq!(
            events[..3],
            [
                ReplayEvent::Key {
                    at_ms: 0,
                    key: "C".into(),
                    outcome: KeyOutcome::AwaitMore,
                },
                ReplayEvent::Key {
                    at_ms: 100,
                    key: "G".into(),
                    outcome: KeyOutcome::Handled,
                },
                shown("GoalCreateModal"),
            ]
        );
        assert_eq!(
            events.last(),
            Some(&ReplayEvent::ModalClosed {
                modal: "GoalCreateModal".into()
            })
        );
        assert!(r.visible_modals().is_empty());
    }

    #[test]
    fn test_slow_chord_does_nothing() {
        let mut r = replayer();
        r.run("c\nwait 900\ng").unwrap();
        assert!(r.visible_modals().is_empty());
        assert!(r
            .events()
            .iter()
            .all(|e| matches!(e, ReplayEvent::Key { .. })));
    }

    #[test]
    fn test_text_focus_blocks_chords() {
        let mut r = replayer();
        r.run("focus text\nc g\nfocus other\ng s").unwrap();
        assert!(r.visible_modals().is_empty());
        assert_eq!(
            r.events().last(),
            Some(&ReplayEvent::Navigated {
                route: Route::Settings
            })
        );
    }

    #[test]
    fn test_hold_and_release() {
        let mut r = replayer();
        r.run("hold shift+/\nrelease shift+/").unwrap();
        let help: Vec<_> = r
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ReplayEvent::ShortcutHelp { visible } => Some(visible),
                _ => None,
            })
            .collect();
        assert_eq!(help, vec![true, false]);
    }

    #[test]
    fn test_publish_and_close_commands() {
        let mut r = replayer();
        r.run("publish CommandPaletteModal\npublish CommandPaletteModal")
            .unwrap();
        assert_eq!(r.visible_modals(), vec![ModalName::CommandPalette]);
        // A second publish while open does not re-run on_show
        assert_eq!(r.events(), vec![shown("CommandPaletteModal")]);

        r.run("close CommandPaletteModal").unwrap();
        assert!(r.visible_modals().is_empty());
    }

    #[test]
    fn test_script_errors_carry_line_numbers() {
        let mut r = replayer();
        let err = r.run("# comment\n\npublish NopeModal").unwrap_err();
        assert!(matches!(err, ReplayError::UnknownModal { line: 3, .. }));

        let err = r.run("wait soon").unwrap_err();
        assert!(matches!(err, ReplayError::Syntax { line: 1, .. }));

        let err = r.run("ctrl+").unwrap_err();
        assert!(matches!(err, ReplayError::Key { line: 1, .. }));
    }

    #[test]
    fn test_events_serialize_tagged() {
        let event = ReplayEvent::Navigated {
            route: Route::Issues,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"navigated","route":"issues"}"#);
    }
}
