//! Modal host: owns the visibility and payload of one named modal
//!
//! A host subscribes to its channel on the bus when mounted. Any publish
//! opens it (or replaces the payload if it is already open); only an explicit
//! close, including the Escape binding the host registers, hides it again.
//!
//! ```text
//! Hidden ──publish(p)──▶ Visible(p) ──publish(p')──▶ Visible(p')
//!   ▲                        │
//!   └──────── close ─────────┘
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::bus::{HostClaim, ModalEventBus, Subscription};
use super::channel::{Channel, ModalName};
use crate::keymap::{
    Binding, ChordSequencer, EventPolicy, KeyCode, KeymapError, Keystroke, Registration,
};

type ShowCallback<P> = Box<dyn FnMut(Option<&P>) -> anyhow::Result<()>>;
type CloseCallback = Box<dyn FnMut() -> anyhow::Result<()>>;

/// Visibility of a modal and the payload it was opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState<P> {
    Hidden,
    Visible(Option<P>),
}

impl<P> ModalState<P> {
    pub fn is_visible(&self) -> bool {
        matches!(self, ModalState::Visible(_))
    }

    /// Payload, only while visible
    pub fn payload(&self) -> Option<&P> {
        match self {
            ModalState::Visible(payload) => payload.as_ref(),
            ModalState::Hidden => None,
        }
    }
}

impl<P> Default for ModalState<P> {
    fn default() -> Self {
        ModalState::Hidden
    }
}

/// Key input that opens a modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Binding(Binding),
    Chord(Vec<Keystroke>),
}

impl From<Binding> for Trigger {
    fn from(binding: Binding) -> Self {
        Trigger::Binding(binding)
    }
}

impl From<Vec<Keystroke>> for Trigger {
    fn from(chord: Vec<Keystroke>) -> Self {
        Trigger::Chord(chord)
    }
}

struct HostInner<C: Channel> {
    state: RefCell<ModalState<C::Payload>>,
    on_show: RefCell<Option<ShowCallback<C::Payload>>>,
    on_close: RefCell<Option<CloseCallback>>,
    /// Set when the host reopens while its own on_show is running
    reshow: Cell<bool>,
}

impl<C: Channel> HostInner<C> {
    fn is_visible(&self) -> bool {
        self.state.borrow().is_visible()
    }

    /// Returns true on the Hidden → Visible edge
    fn open(&self, payload: Option<C::Payload>) -> bool {
        let was_visible = {
            let mut state = self.state.borrow_mut();
            let was_visible = state.is_visible();
            *state = ModalState::Visible(payload);
            was_visible
        };

        if was_visible {
            tracing::debug!(modal = %C::NAME, "payload replaced on open modal");
            return false;
        }
        tracing::debug!(modal = %C::NAME, "modal shown");

        self.show();
        true
    }

    /// Run on_show, then again for every reopen it caused while still visible
    fn show(&self) {
        let Ok(mut slot) = self.on_show.try_borrow_mut() else {
            tracing::trace!(modal = %C::NAME, "reopened inside on_show, deferring");
            self.reshow.set(true);
            return;
        };
        let Some(on_show) = slot.as_mut() else {
            return;
        };
        loop {
            // Hand the callback a snapshot so it may close or reopen the host
            let payload = self.state.borrow().payload().cloned();
            if let Err(e) = on_show(payload.as_ref()) {
                tracing::warn!(modal = %C::NAME, "on_show failed: {:#}", e);
            }
            if !self.reshow.replace(false) || !self.is_visible() {
                break;
            }
        }
    }

    /// Returns true on the Visible → Hidden edge
    fn close(&self) -> bool {
        let was_visible = {
            let mut state = self.state.borrow_mut();
            std::mem::replace(&mut *state, ModalState::Hidden).is_visible()
        };
        if !was_visible {
            return false;
        }
        tracing::debug!(modal = %C::NAME, "modal closed");

        match self.on_close.try_borrow_mut() {
            Ok(mut slot) => {
                if let Some(on_close) = slot.as_mut() {
                    if let Err(e) = on_close() {
                        tracing::warn!(modal = %C::NAME, "on_close failed: {:#}", e);
                    }
                }
            }
            Err(_) => tracing::warn!(modal = %C::NAME, "on_close re-entered"),
        }
        true
    }
}

/// Configures a [`ModalHost`] before mounting it
pub struct ModalHostBuilder<C: Channel> {
    on_show: Option<ShowCallback<C::Payload>>,
    on_close: Option<CloseCallback>,
    shortcut: Option<Trigger>,
}

impl<C: Channel> ModalHostBuilder<C> {
    /// Called once per Hidden → Visible transition with the received payload
    ///
    /// If the callback closes and reopens the host, the nested show is
    /// deferred and the callback runs again after it returns.
    pub fn on_show<F>(mut self, f: F) -> Self
    where
        F: FnMut(Option<&C::Payload>) -> anyhow::Result<()> + 'static,
    {
        self.on_show = Some(Box::new(f));
        self
    }

    /// Called once per Visible → Hidden transition
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }

    /// Key binding or chord that opens the modal with no payload
    pub fn shortcut(mut self, trigger: impl Into<Trigger>) -> Self {
        self.shortcut = Some(trigger.into());
        self
    }

    /// Subscribe to the bus and register the host's keys
    pub fn mount(
        self,
        bus: &ModalEventBus,
        sequencer: &ChordSequencer,
    ) -> Result<ModalHost<C>, KeymapError> {
        let claim = bus.claim_host(C::NAME);

        let inner = Rc::new(HostInner::<C> {
            state: RefCell::new(ModalState::Hidden),
            on_show: RefCell::new(self.on_show),
            on_close: RefCell::new(self.on_close),
            reshow: Cell::new(false),
        });

        let weak = Rc::downgrade(&inner);
        let subscription = bus.subscribe::<C, _>(move |event| {
            if let Some(host) = weak.upgrade() {
                host.open(event.payload().cloned());
            }
            Ok(())
        });

        let mut registrations = Vec::with_capacity(2);

        // Escape closes from anywhere, including text fields inside the modal
        let weak = Rc::downgrade(&inner);
        registrations.push(sequencer.register_binding(
            Binding::key(KeyCode::Escape)
                .in_text_entry()
                .policy(EventPolicy::passive()),
            move || {
                if let Some(host) = weak.upgrade() {
                    host.close();
                }
                Ok(())
            },
        ));

        if let Some(trigger) = self.shortcut {
            let weak: Weak<HostInner<C>> = Rc::downgrade(&inner);
            let open = move || {
                if let Some(host) = weak.upgrade() {
                    if !host.is_visible() {
                        host.open(None);
                    }
                }
                Ok(())
            };
            let registration = match trigger {
                Trigger::Binding(binding) => sequencer.register_binding(binding, open),
                Trigger::Chord(chord) => sequencer.register_chord(chord, open)?,
            };
            registrations.push(registration);
        }

        tracing::debug!(modal = %C::NAME, "modal host mounted");
        Ok(ModalHost {
            inner,
            _subscription: subscription,
            _registrations: registrations,
            _claim: claim,
        })
    }
}

/// A mounted modal; dropping it unsubscribes and unregisters its keys
pub struct ModalHost<C: Channel> {
    inner: Rc<HostInner<C>>,
    _subscription: Subscription,
    _registrations: Vec<Registration>,
    _claim: HostClaim,
}

impl<C: Channel> ModalHost<C> {
    pub fn builder() -> ModalHostBuilder<C> {
        ModalHostBuilder {
            on_show: None,
            on_close: None,
            shortcut: None,
        }
    }

    pub fn name(&self) -> ModalName {
        C::NAME
    }

    pub fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }

    pub fn state(&self) -> ModalState<C::Payload> {
        self.inner.state.borrow().clone()
    }

    /// Last received payload; always `None` while hidden
    pub fn payload(&self) -> Option<C::Payload> {
        self.inner.state.borrow().payload().cloned()
    }

    /// Open directly, bypassing the bus. Returns true if it was hidden.
    pub fn open(&self, payload: Option<C::Payload>) -> bool {
        self.inner.open(payload)
    }

    /// Returns true if it was visible
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    /// Close if open, otherwise open with no payload
    pub fn toggle(&self) {
        if !self.inner.close() {
            self.inner.open(None);
        }
    }

    /// Handle for children of the modal (forms, confirm buttons)
    pub fn context(&self) -> ModalContext<C> {
        ModalContext {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Channel> fmt::Debug for ModalHost<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalHost")
            .field("name", &C::NAME)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

/// Read access to a host's payload plus its close action
pub struct ModalContext<C: Channel> {
    inner: Rc<HostInner<C>>,
}

impl<C: Channel> Clone for ModalContext<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Channel> ModalContext<C> {
    pub fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }

    pub fn payload(&self) -> Option<C::Payload> {
        self.inner.state.borrow().payload().cloned()
    }

    pub fn close(&self) -> bool {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{BindingMatcher, KeyEvent, Platform};
    use crate::modal::channel::{EntityId, GoalCreateModal, GoalCreatePayload};
    use std::time::Instant;

    fn setup() -> (ModalEventBus, ChordSequencer) {
        (
            ModalEventBus::new(),
            ChordSequencer::new(BindingMatcher::new(Platform::Other)),
        )
    }

    fn payload(project: &str) -> GoalCreatePayload {
        GoalCreatePayload {
            project: Some(EntityId::new(project)),
            parent_goal: None,
        }
    }

    #[test]
    fn test_starts_hidden() {
        let (bus, seq) = setup();
        let host = ModalHost::<GoalCreateModal>::builder()
            .mount(&bus, &seq)
            .unwrap();
        assert!(!host.is_visible());
        assert_eq!(host.state(), ModalState::Hidden);
        assert_eq!(host.payload(), None);
    }

    #[test]
    fn test_double_open_replaces_payload_without_callbacks() {
        let (bus, seq) = setup();
        let shows = Rc::new(Cell::new(0));
        let closes = Rc::new(Cell::new(0));
        let (s, c) = (Rc::clone(&shows), Rc::clone(&closes));
        let host = ModalHost::<GoalCreateModal>::builder()
            .on_show(move |_| {
                s.set(s.get() + 1);
                Ok(())
            })
            .on_close(move || {
                c.set(c.get() + 1);
                Ok(())
            })
            .mount(&bus, &seq)
            .unwrap();

        bus.dispatch::<GoalCreateModal>(Some(payload("a")));
        bus.dispatch::<GoalCreateModal>(Some(payload("b")));

        assert!(host.is_visible());
        assert_eq!(host.payload(), Some(payload("b")));
        assert_eq!(shows.get(), 1);
        assert_eq!(closes.get(), 0);
    }

    #[test]
    fn test_close_clears_payload_and_fires_once() {
        let (bus, seq) = setup();
        let closes = Rc::new(Cell::new(0));
        let c = Rc::clone(&closes);
        let host = ModalHost::<GoalCreateModal>::builder()
            .on_close(move || {
                c.set(c.get() + 1);
                Ok(())
            })
            .mount(&bus, &seq)
            .unwrap();

        host.open(Some(payload("a")));
        assert!(host.close());
        assert!(!host.close());
        assert_eq!(closes.get(), 1);
        assert_eq!(host.payload(), None);
    }

    #[test]
    fn test_escape_closes_only_when_visible() {
        let (bus, seq) = setup();
        let closes = Rc::new(Cell::new(0));
        let c = Rc::clone(&closes);
        let host = ModalHost::<GoalCreateModal>::builder()
            .on_close(move || {
                c.set(c.get() + 1);
                Ok(())
            })
            .mount(&bus, &seq)
            .unwrap();

        seq.handle_key(&mut KeyEvent::new(KeyCode::Escape), Instant::now());
        assert_eq!(closes.get(), 0);

        host.open(None);
        seq.handle_key(&mut KeyEvent::new(KeyCode::Escape), Instant::now());
        assert!(!host.is_visible());
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_shortcut_opens_with_empty_payload() {
        let (bus, seq) = setup();
        let host = ModalHost::<GoalCreateModal>::builder()
            .shortcut(Binding::char('n'))
            .mount(&bus, &seq)
            .unwrap();

        seq.handle_key(&mut KeyEvent::char('n'), Instant::now());
        assert_eq!(host.state(), ModalState::Visible(None));
    }

    #[test]
    fn test_shortcut_does_not_clobber_open_payload() {
        let (bus, seq) = setup();
        let host = ModalHost::<GoalCreateModal>::builder()
            .shortcut(Binding::char('n'))
            .mount(&bus, &seq)
            .unwrap();

        host.open(Some(payload("a")));
        seq.handle_key(&mut KeyEvent::char('n'), Instant::now());
        assert_eq!(host.payload(), Some(payload("a")));
    }

    #[test]
    fn test_empty_chord_shortcut_fails_mount() {
        let (bus, seq) = setup();
        let result = ModalHost::<GoalCreateModal>::builder()
            .shortcut(Vec::<Keystroke>::new())
            .mount(&bus, &seq);
        assert!(matches!(result, Err(KeymapError::EmptySequence)));
    }

    #[test]
    fn test_toggle() {
        let (bus, seq) = setup();
        let host = ModalHost::<GoalCreateModal>::builder()
            .mount(&bus, &seq)
            .unwrap();
        host.toggle();
        assert!(host.is_visible());
        host.toggle();
        assert!(!host.is_visible());
    }

    #[test]
    fn test_context_close_from_child() {
        let (bus, seq) = setup();
        let host = ModalHost::<GoalCreateModal>::builder()
            .mount(&bus, &seq)
            .unwrap();
        let ctx = host.context();

        host.open(Some(payload("a")));
        assert_eq!(ctx.payload(), Some(payload("a")));
        assert!(ctx.close());
        assert!(!host.is_visible());
    }

    #[test]
    fn test_on_show_may_close_host() {
        let (bus, seq) = setup();
        let slot: Rc<RefCell<Option<ModalContext<GoalCreateModal>>>> =
            Rc::new(RefCell::new(None));
        let s = Rc::clone(&slot);
        let host = ModalHost::<GoalCreateModal>::builder()
            .on_show(move |_| {
                if let Some(ctx) = s.borrow().as_ref() {
                    ctx.close();
                }
                Ok(())
            })
            .mount(&bus, &seq)
            .unwrap();
        *slot.borrow_mut() = Some(host.context());

        bus.dispatch::<GoalCreateModal>(None);
        assert!(!host.is_visible());
    }

    #[test]
    fn test_reopen_inside_on_show_runs_it_again() {
        let (bus, seq) = setup();
        let slot: Rc<RefCell<Option<ModalContext<GoalCreateModal>>>> =
            Rc::new(RefCell::new(None));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s, log, b) = (Rc::clone(&slot), Rc::clone(&seen), bus.clone());
        let host = ModalHost::<GoalCreateModal>::builder()
            .on_show(move |p| {
                log.borrow_mut().push(p.cloned());
                if log.borrow().len() == 1 {
                    if let Some(ctx) = s.borrow().as_ref() {
                        ctx.close();
                    }
                    b.dispatch::<GoalCreateModal>(Some(payload("b")));
                }
                Ok(())
            })
            .mount(&bus, &seq)
            .unwrap();
        *slot.borrow_mut() = Some(host.context());

        assert!(host.open(Some(payload("a"))));
        assert_eq!(*seen.borrow(), vec![Some(payload("a")), Some(payload("b"))]);
        assert_eq!(host.payload(), Some(payload("b")));
    }

    #[test]
    fn test_unmount_releases_everything() {
        let (bus, seq) = setup();
        let host = ModalHost::<GoalCreateModal>::builder()
            .shortcut(Binding::char('n'))
            .mount(&bus, &seq)
            .unwrap();
        assert_eq!(bus.subscriber_count::<GoalCreateModal>(), 1);
        assert_eq!(bus.host_count(ModalName::GoalCreate), 1);
        assert_eq!(seq.len(), 2);

        drop(host);
        assert_eq!(bus.subscriber_count::<GoalCreateModal>(), 0);
        assert_eq!(bus.host_count(ModalName::GoalCreate), 0);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_duplicate_host_is_tolerated() {
        let (bus, seq) = setup();
        let first = ModalHost::<GoalCreateModal>::builder()
            .mount(&bus, &seq)
            .unwrap();
        let second = ModalHost::<GoalCreateModal>::builder()
            .mount(&bus, &seq)
            .unwrap();
        assert_eq!(bus.host_count(ModalName::GoalCreate), 2);

        bus.dispatch::<GoalCreateModal>(None);
        assert!(first.is_visible() || second.is_visible());
    }
}
