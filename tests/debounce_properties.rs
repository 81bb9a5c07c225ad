// tests/debounce_properties.rs

use std::time::{Duration, Instant};

use proptest::prelude::*;
use treewatch::engine::PendingNotification;

/// Replay events at the given offsets (ms) and probe the clock every
/// millisecond until `horizon_ms`. Returns the offsets of all deliveries.
fn deliveries(event_offsets: &[u64], quiet_ms: u64, horizon_ms: u64) -> Vec<u64> {
    let start = Instant::now();
    let quiet = Duration::from_millis(quiet_ms);
    let mut pending = PendingNotification::new();
    let mut delivered = Vec::new();

    for t in 0..=horizon_ms {
        let now = start + Duration::from_millis(t);
        for _ in event_offsets.iter().filter(|&&e| e == t) {
            pending.record(now);
        }
        if pending.take_due(now, quiet) {
            delivered.push(t);
        }
    }
    delivered
}

/// Absolute offsets from a list of gaps.
fn offsets(gaps: &[u64]) -> Vec<u64> {
    gaps.iter()
        .scan(0u64, |at, gap| {
            *at += gap;
            Some(*at)
        })
        .collect()
}

proptest! {
    #[test]
    fn events_closer_than_the_quiet_period_coalesce(
        quiet_ms in 5u64..50,
        raw_gaps in proptest::collection::vec(0u64..1000, 1..20),
    ) {
        let gaps: Vec<u64> = raw_gaps.iter().map(|g| g % quiet_ms).collect();
        let events = offsets(&gaps);
        let last = *events.last().unwrap();

        let delivered = deliveries(&events, quiet_ms, last + quiet_ms * 3);

        // Exactly one delivery, at the first probe after the quiet period.
        prop_assert_eq!(delivered, vec![last + quiet_ms + 1]);
    }

    #[test]
    fn deliveries_never_precede_the_quiet_period(
        quiet_ms in 1u64..40,
        gaps in proptest::collection::vec(0u64..100, 1..20),
    ) {
        let events = offsets(&gaps);
        let last = *events.last().unwrap();

        for at in deliveries(&events, quiet_ms, last + quiet_ms * 2) {
            let latest_before = events.iter().filter(|&&e| e <= at).max().copied().unwrap();
            prop_assert!(at - latest_before > quiet_ms);
        }
    }

    #[test]
    fn every_burst_separated_by_a_long_pause_is_delivered(
        quiet_ms in 1u64..20,
        bursts in 1usize..6,
    ) {
        // Single events spaced far apart deliver once each.
        let events: Vec<u64> = (0..bursts as u64).map(|i| i * quiet_ms * 4).collect();
        let last = *events.last().unwrap();

        let delivered = deliveries(&events, quiet_ms, last + quiet_ms * 2);
        prop_assert_eq!(delivered.len(), bursts);
    }
}

#[test]
fn zero_quiet_period_delivers_immediately() {
    let now = Instant::now();
    let mut pending = PendingNotification::new();
    assert!(!pending.take_due(now, Duration::ZERO));

    pending.record(now);
    assert!(pending.is_pending());
    assert!(pending.take_due(now, Duration::ZERO));
    assert!(!pending.take_due(now, Duration::ZERO));
}

#[test]
fn delivery_requires_strictly_more_than_the_quiet_period() {
    let start = Instant::now();
    let quiet = Duration::from_millis(100);
    let mut pending = PendingNotification::new();
    pending.record(start);

    assert!(!pending.take_due(start + quiet, quiet));
    assert!(pending.take_due(start + quiet + Duration::from_millis(1), quiet));
    assert!(!pending.is_pending());
    assert_eq!(pending.last_event(), Some(start));
}
