//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use trackline::keymap::{
    BindingMatcher, ChordSequencer, FocusOrigin, KeyAction, KeyCode, KeyEvent, Platform,
};
use trackline::modal::ModalEventBus;

/// Bus and sequencer wired for non-Mac modifier roles, plus a virtual clock
pub struct Harness {
    pub bus: ModalEventBus,
    pub seq: ChordSequencer,
    pub start: Instant,
    pub elapsed: Duration,
}

impl Harness {
    pub fn new() -> Self {
        Self::for_platform(Platform::Other)
    }

    pub fn for_platform(platform: Platform) -> Self {
        Self {
            bus: ModalEventBus::new(),
            seq: ChordSequencer::new(BindingMatcher::new(platform)),
            start: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn now(&self) -> Instant {
        self.start + self.elapsed
    }

    pub fn wait_ms(&mut self, ms: u64) {
        self.elapsed += Duration::from_millis(ms);
    }

    /// Press a plain character key outside any text field
    pub fn press(&self, c: char) -> KeyAction {
        self.seq.handle_key(&mut KeyEvent::char(c), self.now())
    }

    pub fn press_key(&self, key: KeyCode) -> KeyAction {
        self.seq.handle_key(&mut KeyEvent::new(key), self.now())
    }

    /// Press a character key while a text field has focus
    pub fn type_char(&self, c: char) -> KeyAction {
        let mut event = KeyEvent::char(c).with_origin(FocusOrigin::TextEntry);
        self.seq.handle_key(&mut event, self.now())
    }
}

/// Shared call counter
pub fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

/// Shared log of values seen by a callback
pub fn recorder<T>() -> Rc<RefCell<Vec<T>>> {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn bump(counter: &Rc<Cell<usize>>) {
    counter.set(counter.get() + 1);
}
