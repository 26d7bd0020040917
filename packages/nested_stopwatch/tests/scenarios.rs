//! End-to-end timing scenarios exercised through the public API with explicit instants.

#![allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "panic is fine in tests"
)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use nested_stopwatch::{Key, Path, Snapshot, Span};

fn instant(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + TimeDelta::seconds(seconds)
}

/// Asserts the enclosure rules on every span of the subtree.
fn assert_enclosed(snapshot: &Snapshot) {
    if let (Some(started_at), Some(stopped_at)) = (snapshot.started_at(), snapshot.stopped_at()) {
        assert!(started_at <= stopped_at, "{} starts after it stops", snapshot.key());
    }

    for child in snapshot.breakdown() {
        assert_enclosed(child);

        if let Some(child_start) = child.started_at() {
            assert!(snapshot.started_at().unwrap() <= child_start);
        }

        if let Some(child_stop) = child.stopped_at() {
            assert!(snapshot.stopped_at().unwrap() >= child_stop);
        }
    }
}

#[test]
fn nested_child_is_covered_by_parent_and_root() {
    let root = Span::new();

    root.start_at(instant(1), "A");
    root.start_at(instant(2), ["A", "a"]);
    root.stop_at(instant(3), ["A", "a"]);
    root.stop_at(instant(4), "A");
    root.stop_at(instant(5), ());

    let result = root.result().unwrap();
    assert_eq!(result.started_at(), Some(instant(1)));
    assert!(result.stopped_at().unwrap() >= instant(4));

    let a_upper = result.find("A").unwrap();
    assert_eq!(a_upper.breakdown().len(), 1);
    assert_eq!(a_upper.breakdown()[0].key(), &Key::from("a"));
    assert_eq!(a_upper.stopped_at(), Some(instant(4)));
    assert_eq!(a_upper.breakdown()[0].stopped_at(), Some(instant(3)));

    assert_enclosed(&result);
}

#[test]
fn root_auto_bounds_sequential_children() {
    let root = Span::new();

    root.start_at(instant(1), "first");
    root.stop_at(instant(2), "first");
    root.start_at(instant(3), "second");
    root.stop_at(instant(4), "second");

    assert_eq!(root.started_at(), Some(instant(1)));
    assert_eq!(root.stopped_at(), Some(instant(4)));
    assert_enclosed(&root.snapshot());
}

#[test]
fn stopping_earlier_never_shrinks() {
    let root = Span::new();

    root.start_at(instant(1), "a");
    root.stop_at(instant(5), "a");
    root.stop_at(instant(3), "a");

    assert_eq!(root.find("a").unwrap().stopped_at(), Some(instant(5)));
    assert_eq!(root.stopped_at(), Some(instant(5)));
}

#[test]
fn late_parent_start_does_not_postdate_children() {
    let root = Span::new();

    root.start_at(instant(2), ["batch", "item"]);
    root.start_at(instant(6), "batch");

    assert_eq!(root.find("batch").unwrap().started_at(), Some(instant(2)));
}

#[test]
fn stop_before_recorded_start_keeps_span_consistent() {
    let root = Span::new();

    root.start_at(instant(10), "a");
    root.stop_at(instant(1), "a");

    let a = root.find("a").unwrap();
    assert_eq!(a.started_at(), Some(instant(10)));
    assert_eq!(a.stopped_at(), Some(instant(10)));
    assert_enclosed(&root.snapshot());
}

#[test]
fn stopping_unstarted_span_before_ancestor_start_moves_ancestors_earlier() {
    let root = Span::new();

    root.start_at(instant(10), "p");
    let a = root.create(["p", "a"]);
    root.stop_at(instant(5), ["p", "a"]);

    assert_eq!(a.started_at(), Some(instant(5)));
    assert_eq!(a.stopped_at(), Some(instant(5)));

    let p = root.find("p").unwrap();
    assert_eq!(p.started_at(), Some(instant(5)));
    assert_eq!(p.stopped_at(), Some(instant(5)));
    assert_eq!(root.started_at(), Some(instant(5)));

    assert_enclosed(&root.snapshot());
}

#[test]
fn integer_keys_address_spans() {
    let root = Span::new();

    for i in 0..5_i64 {
        root.start_at(instant(i), i);
        root.stop_at(instant(i + 1), i);
    }

    let result = root.result().unwrap();
    let keys: Vec<_> = result.breakdown().iter().map(|s| s.key().clone()).collect();

    assert_eq!(keys, (0..5_i64).map(Key::from).collect::<Vec<_>>());
    assert_eq!(result.started_at(), Some(instant(0)));
    assert_eq!(result.stopped_at(), Some(instant(5)));
    assert!(result.find("0").is_err());
}

#[test]
fn mixed_call_sequence_upholds_invariants() {
    let root = Span::new();

    root.start_at(instant(3), ["x", "y", "z"]);
    root.stop_at(instant(4), ["x", "y"]);
    root.start_at(instant(1), ["x", "w"]);
    root.start_at(instant(6), ["v"]);
    root.stop_at(instant(2), "x");
    root.start_at(instant(7), ["x", "late"]);
    root.stop_at(instant(8), ());

    let result = root.result().unwrap();
    assert_enclosed(&result);
    assert_eq!(result.started_at(), Some(instant(1)));
    assert_eq!(result.stopped_at(), Some(instant(8)));
    assert_eq!(
        result.find(["x", "late"]).unwrap().stopped_at(),
        Some(instant(8))
    );
}

#[test]
fn disabled_root_records_nothing() {
    let root = Span::new().disable();

    root.start("first");
    root.stop("first");
    root.start(["second", "third"]);
    root.stop(["second", "third"]);

    assert!(root.result().is_none());
    assert!(root.started_at().is_none());
    assert!(root.stopped_at().is_none());
    assert!(root.breakdown().is_empty());
}

/// `SplitMix64`, so every run replays the same call sequences.
struct SeededSequence(u64);

impl SeededSequence {
    fn below(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        (z ^ (z >> 31)) % bound
    }

    fn path(&mut self) -> Path {
        const KEYS: [&str; 3] = ["a", "b", "c"];

        let depth = self.below(4);
        (0..depth)
            .map(|_| KEYS[usize::try_from(self.below(3)).unwrap()])
            .collect()
    }

    fn instant(&mut self) -> DateTime<Utc> {
        instant(i64::try_from(self.below(100)).unwrap())
    }
}

#[test]
fn generated_call_sequences_uphold_invariants() {
    for seed in 0..200 {
        let mut sequence = SeededSequence(seed);
        let root = Span::new();

        for _ in 0..40 {
            let path = sequence.path();

            match sequence.below(3) {
                0 => {
                    let at = sequence.instant();
                    root.start_at(at, path);
                }
                1 => {
                    let at = sequence.instant();
                    root.stop_at(at, path);
                }
                _ => {
                    let _created = root.create(path);
                }
            }

            assert_enclosed(&root.snapshot());
        }

        root.stop_at(sequence.instant(), ());
        assert_enclosed(&root.snapshot());
    }
}
