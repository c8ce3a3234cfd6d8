//! Typed publish/subscribe bus for opening modals from anywhere in the UI
//!
//! Any component holding a [`ModalEventBus`] clone can publish to a channel;
//! the host subscribed to that channel receives the payload. Publishing to a
//! channel with no subscriber is a silent no-op and nothing is retained for
//! late subscribers.
//!
//! Publishes issued from inside a handler are held until the current handler
//! list has run to completion, then delivered depth-first: each nested
//! publish finishes, including its own nested publishes, before the next one
//! starts.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use super::channel::{Channel, ModalName};

type ErasedHandler = Rc<RefCell<dyn FnMut(&(dyn Any + 'static)) -> anyhow::Result<()>>>;

/// A publish as seen by subscribers
///
/// Mirrors a bubbling, cancelable DOM `CustomEvent`: handlers read the
/// payload and may call [`ModalEvent::prevent_default`].
#[derive(Debug)]
pub struct ModalEvent<P> {
    name: ModalName,
    payload: Option<P>,
    default_prevented: Cell<bool>,
}

impl<P> ModalEvent<P> {
    pub fn new(name: ModalName, payload: Option<P>) -> Self {
        Self {
            name,
            payload,
            default_prevented: Cell::new(false),
        }
    }

    pub fn name(&self) -> ModalName {
        self.name
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    pub fn bubbles(&self) -> bool {
        true
    }

    pub fn cancelable(&self) -> bool {
        true
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

struct Subscriber {
    id: u64,
    alive: Rc<Cell<bool>>,
    handler: ErasedHandler,
}

struct Queued {
    name: ModalName,
    event: Box<dyn Any>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    channels: HashMap<ModalName, Vec<Subscriber>>,
    /// Nested publishes, one queue per delivery in progress
    frames: Vec<VecDeque<Queued>>,
    hosts: HashMap<ModalName, usize>,
}

/// Handle to a bus subscription; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    name: ModalName,
    id: u64,
    alive: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn name(&self) -> ModalName {
        self.name
    }

    pub fn is_active(&self) -> bool {
        self.alive.get()
    }

    /// Unsubscribe now (same as dropping)
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.alive.set(false);
        tracing::trace!(modal = %self.name, id = self.id, "unsubscribed");
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("active", &self.alive.get())
            .finish()
    }
}

/// Marks a channel as hosted for as long as it lives
pub(crate) struct HostClaim {
    name: ModalName,
    bus: Weak<RefCell<BusInner>>,
}

impl Drop for HostClaim {
    fn drop(&mut self) {
        let Some(inner) = self.bus.upgrade() else {
            return;
        };
        let Ok(mut inner) = inner.try_borrow_mut() else {
            return;
        };
        if let Some(count) = inner.hosts.get_mut(&self.name) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                inner.hosts.remove(&self.name);
            }
        }
    }
}

/// Drops pending nested publishes even if a handler panics
struct DispatchGuard<'a>(&'a RefCell<BusInner>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.frames.clear();
        }
    }
}

/// Shared modal event bus, owned by the application root
///
/// Cloning is cheap; all clones address the same subscribers.
#[derive(Clone, Default)]
pub struct ModalEventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl ModalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a channel; handlers run in subscription order
    pub fn subscribe<C, F>(&self, mut handler: F) -> Subscription
    where
        C: Channel,
        F: FnMut(&ModalEvent<C::Payload>) -> anyhow::Result<()> + 'static,
    {
        let erased = move |event: &(dyn Any + 'static)| {
            match event.downcast_ref::<ModalEvent<C::Payload>>() {
                Some(event) => handler(event),
                None => {
                    tracing::warn!(modal = %C::NAME, "payload type mismatch on channel");
                    Ok(())
                }
            }
        };
        let handler: ErasedHandler = Rc::new(RefCell::new(erased));

        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let alive = Rc::new(Cell::new(true));
        let subscribers = inner.channels.entry(C::NAME).or_default();
        subscribers.retain(|s| s.alive.get());
        subscribers.push(Subscriber {
            id,
            alive: Rc::clone(&alive),
            handler,
        });
        tracing::trace!(modal = %C::NAME, id, "subscribed");

        Subscription {
            name: C::NAME,
            id,
            alive,
        }
    }

    /// Number of live subscribers on a channel
    pub fn subscriber_count<C: Channel>(&self) -> usize {
        self.inner
            .borrow()
            .channels
            .get(&C::NAME)
            .map_or(0, |subs| subs.iter().filter(|s| s.alive.get()).count())
    }

    /// Record a host for `name`, warning if one is already mounted
    pub(crate) fn claim_host(&self, name: ModalName) -> HostClaim {
        let mut inner = self.inner.borrow_mut();
        let count = inner.hosts.entry(name).or_insert(0);
        if *count > 0 {
            tracing::warn!(
                modal = %name,
                hosts = *count + 1,
                "multiple hosts mounted for one modal, receiver is undefined"
            );
        }
        *count += 1;
        HostClaim {
            name,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Number of mounted hosts for a modal
    pub fn host_count(&self, name: ModalName) -> usize {
        self.inner.borrow().hosts.get(&name).copied().unwrap_or(0)
    }

    /// Build a zero-argument publisher, suitable as a click or key handler
    ///
    /// Each call dispatches a fresh event carrying a clone of `payload`. The
    /// closure holds the bus weakly, so storing it inside a subscriber does
    /// not keep the bus alive.
    pub fn publish<C: Channel>(&self, payload: Option<C::Payload>) -> impl Fn() + 'static {
        let bus = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = Weak::upgrade(&bus) {
                ModalEventBus { inner }.dispatch::<C>(payload.clone());
            }
        }
    }

    /// Dispatch an event on a channel now
    ///
    /// Returns false if a handler called `prevent_default`. Publishes made
    /// from inside a handler are deferred and report true.
    pub fn dispatch<C: Channel>(&self, payload: Option<C::Payload>) -> bool {
        let event = ModalEvent::new(C::NAME, payload);

        {
            let mut inner = self.inner.borrow_mut();
            if let Some(frame) = inner.frames.last_mut() {
                tracing::debug!(modal = %C::NAME, "deferring nested publish");
                frame.push_back(Queued {
                    name: C::NAME,
                    event: Box::new(event),
                });
                return true;
            }
        }
        let _guard = DispatchGuard(&self.inner);

        tracing::debug!(modal = %C::NAME, payload = ?event.payload(), "publish");
        self.run(C::NAME, &event);
        !event.default_prevented()
    }

    /// Deliver one event, then each publish its handlers made, depth-first
    fn run(&self, name: ModalName, event: &(dyn Any + 'static)) {
        self.inner.borrow_mut().frames.push(VecDeque::new());
        self.deliver(name, event);
        let nested = self.inner.borrow_mut().frames.pop().unwrap_or_default();

        for queued in nested {
            self.run(queued.name, queued.event.as_ref());
        }
    }

    /// Run the current subscribers of `name`, re-checking each one is still
    /// subscribed right before invoking it
    fn deliver(&self, name: ModalName, event: &(dyn Any + 'static)) {
        let snapshot: Vec<(u64, Rc<Cell<bool>>, ErasedHandler)> = {
            let mut inner = self.inner.borrow_mut();
            let Some(subscribers) = inner.channels.get_mut(&name) else {
                tracing::trace!(modal = %name, "no subscriber, dropping publish");
                return;
            };
            subscribers.retain(|s| s.alive.get());
            subscribers
                .iter()
                .map(|s| (s.id, Rc::clone(&s.alive), Rc::clone(&s.handler)))
                .collect()
        };

        if snapshot.is_empty() {
            tracing::trace!(modal = %name, "no subscriber, dropping publish");
            return;
        }

        for (id, alive, handler) in snapshot {
            if !alive.get() {
                continue;
            }
            let result = match handler.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(event),
                Err(_) => {
                    tracing::warn!(modal = %name, id, "handler re-entered during its own dispatch");
                    continue;
                }
            };
            if let Err(e) = result {
                tracing::warn!(modal = %name, id, "modal handler failed: {:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::channel::{
        EntityId, GoalCreateModal, GoalCreatePayload, ProjectCreateModal, ProjectCreatePayload,
    };

    fn goal_payload(project: &str) -> GoalCreatePayload {
        GoalCreatePayload {
            project: Some(EntityId::new(project)),
            parent_goal: None,
        }
    }

    #[test]
    fn test_publish_without_subscriber_is_noop() {
        let bus = ModalEventBus::new();
        assert!(bus.dispatch::<GoalCreateModal>(Some(goal_payload("p1"))));

        // A late subscriber must not see the earlier publish
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = bus.subscribe::<GoalCreateModal, _>(move |_| {
            s.set(s.get() + 1);
            Ok(())
        });
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn test_payload_round_trips() {
        let bus = ModalEventBus::new();
        let received = Rc::new(RefCell::new(None));
        let r = Rc::clone(&received);
        let _sub = bus.subscribe::<GoalCreateModal, _>(move |event| {
            *r.borrow_mut() = event.payload().cloned();
            Ok(())
        });

        bus.dispatch::<GoalCreateModal>(Some(goal_payload("p1")));
        assert_eq!(*received.borrow(), Some(goal_payload("p1")));
    }

    #[test]
    fn test_channels_do_not_cross() {
        let bus = ModalEventBus::new();
        let project_hits = Rc::new(Cell::new(0));
        let p = Rc::clone(&project_hits);
        let _goal = bus.subscribe::<GoalCreateModal, _>(|_| Ok(()));
        let _project = bus.subscribe::<ProjectCreateModal, _>(move |_| {
            p.set(p.get() + 1);
            Ok(())
        });

        bus.dispatch::<GoalCreateModal>(Some(goal_payload("p1")));
        assert_eq!(project_hits.get(), 0);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = ModalEventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let o = Rc::clone(&order);
                bus.subscribe::<GoalCreateModal, _>(move |_| {
                    o.borrow_mut().push(i);
                    Ok(())
                })
            })
            .collect();

        bus.dispatch::<GoalCreateModal>(None);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn test_publisher_closure_dispatches_each_call() {
        let bus = ModalEventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = bus.subscribe::<ProjectCreateModal, _>(move |_| {
            h.set(h.get() + 1);
            Ok(())
        });

        let open = bus.publish::<ProjectCreateModal>(Some(ProjectCreatePayload::default()));
        open();
        open();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_publisher_outliving_bus_is_inert() {
        let bus = ModalEventBus::new();
        let open = bus.publish::<ProjectCreateModal>(None);
        drop(bus);
        open();
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let bus = ModalEventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = bus.subscribe::<GoalCreateModal, _>(move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        assert_eq!(bus.subscriber_count::<GoalCreateModal>(), 1);

        sub.unsubscribe();
        bus.dispatch::<GoalCreateModal>(None);
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.subscriber_count::<GoalCreateModal>(), 0);
    }

    #[test]
    fn test_nested_publish_runs_after_current_handlers() {
        let bus = ModalEventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let b = bus.clone();
        let _a1 = bus.subscribe::<GoalCreateModal, _>(move |_| {
            l.borrow_mut().push("goal-1");
            b.dispatch::<ProjectCreateModal>(None);
            Ok(())
        });
        let l = Rc::clone(&log);
        let _a2 = bus.subscribe::<GoalCreateModal, _>(move |_| {
            l.borrow_mut().push("goal-2");
            Ok(())
        });
        let l = Rc::clone(&log);
        let _b1 = bus.subscribe::<ProjectCreateModal, _>(move |_| {
            l.borrow_mut().push("project");
            Ok(())
        });

        bus.dispatch::<GoalCreateModal>(None);
        assert_eq!(*log.borrow(), vec!["goal-1", "goal-2", "project"]);
    }

    #[test]
    fn test_nested_publishes_complete_depth_first() {
        use crate::modal::channel::{GoalDeleteModal, GoalDeletePayload, IssueCreateModal};

        let bus = ModalEventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (l, b) = (Rc::clone(&log), bus.clone());
        let _goal_1 = bus.subscribe::<GoalCreateModal, _>(move |_| {
            l.borrow_mut().push("goal-1");
            b.dispatch::<ProjectCreateModal>(None);
            Ok(())
        });
        let (l, b) = (Rc::clone(&log), bus.clone());
        let _goal_2 = bus.subscribe::<GoalCreateModal, _>(move |_| {
            l.borrow_mut().push("goal-2");
            b.dispatch::<GoalDeleteModal>(Some(GoalDeletePayload {
                goal: EntityId::new("g1"),
            }));
            Ok(())
        });
        let (l, b) = (Rc::clone(&log), bus.clone());
        let _project = bus.subscribe::<ProjectCreateModal, _>(move |_| {
            l.borrow_mut().push("project");
            b.dispatch::<IssueCreateModal>(None);
            Ok(())
        });
        let l = Rc::clone(&log);
        let _issue = bus.subscribe::<IssueCreateModal, _>(move |_| {
            l.borrow_mut().push("issue");
            Ok(())
        });
        let l = Rc::clone(&log);
        let _delete = bus.subscribe::<GoalDeleteModal, _>(move |_| {
            l.borrow_mut().push("goal-delete");
            Ok(())
        });

        bus.dispatch::<GoalCreateModal>(None);
        // The issue publish belongs to the project publish, so it runs before
        // the sibling goal-delete publish
        assert_eq!(
            *log.borrow(),
            vec!["goal-1", "goal-2", "project", "issue", "goal-delete"]
        );

        // Nothing is left pending for the next publish
        log.borrow_mut().clear();
        bus.dispatch::<IssueCreateModal>(None);
        assert_eq!(*log.borrow(), vec!["issue"]);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_skips_later_handler() {
        let bus = ModalEventBus::new();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let v = Rc::clone(&victim);
        let _first = bus.subscribe::<GoalCreateModal, _>(move |_| {
            v.borrow_mut().take();
            Ok(())
        });
        let h = Rc::clone(&hits);
        *victim.borrow_mut() = Some(bus.subscribe::<GoalCreateModal, _>(move |_| {
            h.set(h.get() + 1);
            Ok(())
        }));

        bus.dispatch::<GoalCreateModal>(None);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_failing_handler_is_isolated() {
        let bus = ModalEventBus::new();
        let hits = Rc::new(Cell::new(0));
        let _bad = bus.subscribe::<GoalCreateModal, _>(|_| anyhow::bail!("boom"));
        let h = Rc::clone(&hits);
        let _good = bus.subscribe::<GoalCreateModal, _>(move |_| {
            h.set(h.get() + 1);
            Ok(())
        });

        bus.dispatch::<GoalCreateModal>(None);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_prevent_default_reported() {
        let bus = ModalEventBus::new();
        let _sub = bus.subscribe::<GoalCreateModal, _>(|event| {
            assert!(event.cancelable());
            event.prevent_default();
            Ok(())
        });
        assert!(!bus.dispatch::<GoalCreateModal>(None));
    }
}
