//! Keystroke dispatch: single bindings, timed chord sequences and hold keys
//!
//! All three declaration kinds share one pipeline. Every registration hands
//! back a [`Registration`] that unregisters on drop, so nothing registered by
//! a component outlives it.
//!
//! ```text
//! KeyEvent → holds → bindings → chord buffer → actions (outside any borrow)
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::binding::{Binding, EventPolicy};
use super::config::KeymapError;
use super::matcher::BindingMatcher;
use super::types::{KeyEvent, Keystroke, Platform};

/// Maximum gap between two keys of a chord
pub const DEFAULT_CHORD_TIMEOUT: Duration = Duration::from_millis(800);

type SharedAction = Rc<RefCell<dyn FnMut() -> anyhow::Result<()>>>;
type SharedHoldAction = Rc<RefCell<dyn FnMut(bool) -> anyhow::Result<()>>>;

/// Identity of a registration, unique per sequencer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

/// Result of handling a keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// This many actions ran (including ones that returned an error)
    Handled(usize),
    /// Keystroke is part of a chord, await more input
    AwaitMore,
    /// Nothing matched
    NoMatch,
}

enum Kind {
    Binding(Binding),
    Chord(Vec<Binding>),
    Hold { binding: Binding, held: bool },
}

enum Callback {
    Action(SharedAction),
    Hold(SharedHoldAction),
}

struct Entry {
    id: RegistrationId,
    alive: Rc<Cell<bool>>,
    kind: Kind,
    callback: Callback,
}

struct Inner {
    matcher: BindingMatcher,
    timeout: Duration,
    next_id: u64,
    entries: Vec<Entry>,
    buffer: VecDeque<(Keystroke, Instant)>,
}

/// A callback collected during matching, invoked once the borrow is released
struct Pending {
    id: RegistrationId,
    alive: Rc<Cell<bool>>,
    call: PendingCall,
}

enum PendingCall {
    Action(SharedAction),
    Hold(SharedHoldAction, bool),
}

impl Pending {
    /// Run the callback if its registration is still live
    fn invoke(self) -> bool {
        if !self.alive.get() {
            tracing::trace!(id = ?self.id, "skipping action unregistered mid-dispatch");
            return false;
        }
        let result = match &self.call {
            PendingCall::Action(action) => match action.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(),
                Err(_) => {
                    tracing::warn!(id = ?self.id, "action re-entered during its own dispatch");
                    return false;
                }
            },
            PendingCall::Hold(action, held) => match action.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(*held),
                Err(_) => {
                    tracing::warn!(id = ?self.id, "hold action re-entered during its own dispatch");
                    return false;
                }
            },
        };
        if let Err(e) = result {
            tracing::warn!(id = ?self.id, "key action failed: {:#}", e);
        }
        true
    }
}

/// Handle to a registered binding, chord or hold key
///
/// Dropping it unregisters immediately, including for a dispatch already in
/// progress: an action whose registration is gone is never invoked.
#[must_use = "dropping a Registration unregisters it"]
pub struct Registration {
    id: RegistrationId,
    alive: Rc<Cell<bool>>,
}

impl Registration {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.alive.get()
    }

    /// Unregister now (same as dropping)
    pub fn dispose(self) {}
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("active", &self.alive.get())
            .finish()
    }
}

/// Shared keystroke dispatcher
///
/// Cloning is cheap and every clone dispatches to the same registrations.
#[derive(Clone)]
pub struct ChordSequencer {
    inner: Rc<RefCell<Inner>>,
}

impl ChordSequencer {
    pub fn new(matcher: BindingMatcher) -> Self {
        Self::with_timeout(matcher, DEFAULT_CHORD_TIMEOUT)
    }

    pub fn with_timeout(matcher: BindingMatcher, timeout: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                matcher,
                timeout,
                next_id: 0,
                entries: Vec::new(),
                buffer: VecDeque::new(),
            })),
        }
    }

    pub fn matcher(&self) -> BindingMatcher {
        self.inner.borrow().matcher
    }

    pub fn platform(&self) -> Platform {
        self.matcher().platform()
    }

    pub fn timeout(&self) -> Duration {
        self.inner.borrow().timeout
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.inner.borrow_mut().timeout = timeout;
    }

    /// Register a single-keystroke binding
    pub fn register_binding<F>(&self, binding: Binding, action: F) -> Registration
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        let action: SharedAction = Rc::new(RefCell::new(action));
        self.insert(Kind::Binding(binding), Callback::Action(action))
    }

    /// Register an ordered chord such as `c` then `g`
    ///
    /// Each literal is matched strictly, so `shift+c` does not advance a chord
    /// declared with a plain `c`.
    pub fn register_chord<I, F>(&self, literals: I, action: F) -> Result<Registration, KeymapError>
    where
        I: IntoIterator<Item = Keystroke>,
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        let literals: Vec<Binding> = literals.into_iter().map(Binding::new).collect();
        if literals.is_empty() {
            return Err(KeymapError::EmptySequence);
        }
        let action: SharedAction = Rc::new(RefCell::new(action));
        Ok(self.insert(Kind::Chord(literals), Callback::Action(action)))
    }

    /// Register a hold-to-show key: `on_change(true)` on press, `false` on release
    ///
    /// Hold keys fire even while typing in a text field.
    pub fn register_hold<F>(&self, binding: Binding, on_change: F) -> Registration
    where
        F: FnMut(bool) -> anyhow::Result<()> + 'static,
    {
        let on_change: SharedHoldAction = Rc::new(RefCell::new(on_change));
        self.insert(
            Kind::Hold {
                binding,
                held: false,
            },
            Callback::Hold(on_change),
        )
    }

    fn insert(&self, kind: Kind, callback: Callback) -> Registration {
        let mut inner = self.inner.borrow_mut();
        inner.prune();
        let id = RegistrationId(inner.next_id);
        inner.next_id += 1;
        let alive = Rc::new(Cell::new(true));
        inner.entries.push(Entry {
            id,
            alive: Rc::clone(&alive),
            kind,
            callback,
        });
        tracing::trace!(?id, "registered key handler");
        Registration { id, alive }
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|e| e.alive.get())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear pending chord state
    pub fn reset(&self) {
        self.inner.borrow_mut().buffer.clear();
    }

    /// Drop a partial chord whose last key is older than the timeout
    ///
    /// Returns true if something was discarded (the hint needs a redraw).
    pub fn expire(&self, now: Instant) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.is_stale(now) {
            inner.buffer.clear();
            true
        } else {
            false
        }
    }

    pub fn has_pending_chord(&self) -> bool {
        !self.inner.borrow().buffer.is_empty()
    }

    /// Get the pending chord keystrokes (for a status hint)
    pub fn pending_display(&self) -> Option<String> {
        let inner = self.inner.borrow();
        if inner.buffer.is_empty() {
            return None;
        }
        let platform = inner.matcher.platform();
        Some(
            inner
                .buffer
                .iter()
                .map(|(k, _)| k.display_string(platform))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    /// Handle a key event at time `now`
    ///
    /// Matching runs under a borrow of the registry; the collected actions run
    /// afterwards, in registration order, so they may freely register, drop
    /// registrations, or publish. An event whose propagation was already
    /// stopped by a focused component reaches hold keys only.
    pub fn handle_key(&self, event: &mut KeyEvent, now: Instant) -> KeyAction {
        let (calls, awaiting) = self.inner.borrow_mut().collect(event, now);

        let fired = calls.into_iter().map(Pending::invoke).filter(|ran| *ran).count();

        if fired > 0 {
            KeyAction::Handled(fired)
        } else if awaiting {
            KeyAction::AwaitMore
        } else {
            KeyAction::NoMatch
        }
    }
}

impl Inner {
    fn prune(&mut self) {
        self.entries.retain(|e| e.alive.get());
    }

    fn is_stale(&self, now: Instant) -> bool {
        self.buffer
            .back()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) > self.timeout)
    }

    /// Match `event` against every registration; returns callbacks to run and
    /// whether a chord is waiting for more keys
    fn collect(&mut self, event: &mut KeyEvent, now: Instant) -> (Vec<Pending>, bool) {
        self.prune();
        let matcher = self.matcher;
        let stroke = matcher.resolve(event);
        let mut calls = Vec::new();

        // Hold keys see both edges and ignore text-entry focus
        for entry in &mut self.entries {
            let Kind::Hold { binding, held } = &mut entry.kind else {
                continue;
            };
            let Callback::Hold(action) = &entry.callback else {
                continue;
            };
            let edge = if event.is_press() {
                // Auto-repeat presses while held do not re-fire
                (!*held && binding.accepts(&stroke)).then_some(true)
            } else {
                // Modifiers may already be up on release, so match the key only
                (*held && binding.stroke.key == event.key).then_some(false)
            };
            if let Some(state) = edge {
                *held = state;
                // Typing the key into a text field must still insert it
                if state && !event.in_text_entry() {
                    matcher.apply_policy(binding, event);
                }
                calls.push(Pending {
                    id: entry.id,
                    alive: Rc::clone(&entry.alive),
                    call: PendingCall::Hold(Rc::clone(action), state),
                });
            }
        }

        if !event.is_press() {
            return (calls, false);
        }

        // A focused component already consumed the key
        if event.propagation_stopped() {
            tracing::trace!("propagation stopped, skipping bindings and chords");
            return (calls, false);
        }

        for entry in &self.entries {
            let (Kind::Binding(binding), Callback::Action(action)) = (&entry.kind, &entry.callback)
            else {
                continue;
            };
            if event.in_text_entry() && !binding.in_text_entry {
                continue;
            }
            if matcher.consume(binding, event) {
                calls.push(Pending {
                    id: entry.id,
                    alive: Rc::clone(&entry.alive),
                    call: PendingCall::Action(Rc::clone(action)),
                });
            }
        }

        // Global chords never advance while the user is typing
        if event.in_text_entry() {
            return (calls, false);
        }

        let has_chords = self
            .entries
            .iter()
            .any(|e| matches!(e.kind, Kind::Chord(_)));
        if !has_chords {
            self.buffer.clear();
            return (calls, false);
        }

        if self.is_stale(now) {
            tracing::trace!("chord timed out, restarting from new key");
            self.buffer.clear();
        }
        self.buffer.push_back((stroke, now));

        let mut awaiting = false;
        while !self.buffer.is_empty() {
            if let Some(pending) = self.completed_chord() {
                tracing::debug!(id = ?pending.id, "chord completed");
                calls.push(pending);
                EventPolicy::global().apply_to(event);
                self.buffer.clear();
                break;
            }
            if self.buffer_is_prefix() {
                awaiting = true;
                break;
            }
            // Retry from the next key so a fresh chord can start immediately
            self.buffer.pop_front();
        }

        (calls, awaiting)
    }

    /// First chord (registration order) matching the tail of the buffer
    fn completed_chord(&self) -> Option<Pending> {
        self.entries.iter().find_map(|entry| {
            let (Kind::Chord(literals), Callback::Action(action)) = (&entry.kind, &entry.callback)
            else {
                return None;
            };
            if literals.len() > self.buffer.len() {
                return None;
            }
            let tail = self.buffer.iter().skip(self.buffer.len() - literals.len());
            let complete = literals
                .iter()
                .zip(tail)
                .all(|(literal, (stroke, _))| literal.accepts(stroke));
            complete.then(|| Pending {
                id: entry.id,
                alive: Rc::clone(&entry.alive),
                call: PendingCall::Action(Rc::clone(action)),
            })
        })
    }

    /// Whether the whole buffer is a strict, non-empty prefix of some chord
    fn buffer_is_prefix(&self) -> bool {
        self.entries.iter().any(|entry| {
            let Kind::Chord(literals) = &entry.kind else {
                return false;
            };
            literals.len() > self.buffer.len()
                && literals
                    .iter()
                    .zip(&self.buffer)
                    .all(|(literal, (stroke, _))| literal.accepts(stroke))
        })
    }
}
