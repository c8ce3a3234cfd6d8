//! Benchmarks for per-keystroke and per-publish paths
//!
//! - ChordSequencer::handle_key with many chords registered
//! - ModalEventBus::dispatch fan-out
//! - fuzzy_filter over option lists
//!
//! Run with: cargo bench dispatch

use std::time::{Duration, Instant};

use trackline::keymap::{
    BindingMatcher, ChordSequencer, KeyEvent, Keystroke, Platform, Registration,
};
use trackline::modal::{GoalCreateModal, GoalCreatePayload, ModalEventBus, Subscription};
use trackline::typeahead::fuzzy_filter;

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

// ============================================================================
// Chord sequencing
// ============================================================================

/// `count` two-key chords spread over the alphabet
fn sequencer_with_chords(count: usize) -> (ChordSequencer, Vec<Registration>) {
    let seq = ChordSequencer::new(BindingMatcher::new(Platform::Other));
    let letters: Vec<char> = ('a'..='z').collect();
    let regs = (0..count)
        .map(|i| {
            let first = letters[i % letters.len()];
            let second = letters[(i / letters.len()) % letters.len()];
            seq.register_chord([Keystroke::char(first), Keystroke::char(second)], || Ok(()))
                .unwrap()
        })
        .collect();
    (seq, regs)
}

#[divan::bench(args = [10, 100, 500])]
fn chord_complete(bencher: divan::Bencher, chords: usize) {
    let (seq, _regs) = sequencer_with_chords(chords);
    let t0 = Instant::now();

    bencher.bench_local(|| {
        seq.handle_key(&mut KeyEvent::char('c'), t0);
        divan::black_box(seq.handle_key(
            &mut KeyEvent::char('a'),
            t0 + Duration::from_millis(50),
        ))
    });
}

#[divan::bench(args = [10, 100, 500])]
fn unmatched_key(bencher: divan::Bencher, chords: usize) {
    let (seq, _regs) = sequencer_with_chords(chords);
    let t0 = Instant::now();

    bencher.bench_local(|| divan::black_box(seq.handle_key(&mut KeyEvent::char('7'), t0)));
}

// ============================================================================
// Modal bus
// ============================================================================

#[divan::bench(args = [1, 10, 100])]
fn bus_dispatch(bencher: divan::Bencher, subscribers: usize) {
    let bus = ModalEventBus::new();
    let _subs: Vec<Subscription> = (0..subscribers)
        .map(|_| {
            bus.subscribe::<GoalCreateModal, _>(|event| {
                divan::black_box(event.payload());
                Ok(())
            })
        })
        .collect();

    bencher.bench_local(|| {
        divan::black_box(bus.dispatch::<GoalCreateModal>(Some(GoalCreatePayload::default())))
    });
}

// ============================================================================
// Type-ahead filtering
// ============================================================================

fn project_names(count: usize) -> Vec<String> {
    let words = ["Platform", "Billing", "Mobile", "Search", "Infra", "Design"];
    (0..count)
        .map(|i| format!("{} {} {}", words[i % words.len()], words[(i / 6) % 6], i))
        .collect()
}

#[divan::bench(args = [100, 1_000, 10_000])]
fn filter_options(bencher: divan::Bencher, count: usize) {
    let names = project_names(count);

    bencher.bench_local(|| divan::black_box(fuzzy_filter(&names, "bill mob", |s| s.as_str())));
}
