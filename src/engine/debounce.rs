// src/engine/debounce.rs

//! Quiet-period debounce clock.
//!
//! Any number of qualifying events between two deliveries collapse into one
//! delivery, and the window slides: a delivery never happens before the
//! quiet period has elapsed since the *latest* qualifying event.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingNotification {
    pending: bool,
    last_event: Option<Instant>,
}

impl PendingNotification {
    pub fn new() -> Self {
        Self::default()
    }

    /// A qualifying event happened at `at`.
    pub fn record(&mut self, at: Instant) {
        self.pending = true;
        self.last_event = Some(at);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_event(&self) -> Option<Instant> {
        self.last_event
    }

    /// Whether a delivery is owed at `now`.
    pub fn is_due(&self, now: Instant, quiet_period: Duration) -> bool {
        if !self.pending {
            return false;
        }
        if quiet_period.is_zero() {
            return true;
        }
        match self.last_event {
            Some(last) => now.saturating_duration_since(last) > quiet_period,
            None => true,
        }
    }

    /// Clear the pending flag if a delivery is due; the caller delivers
    /// exactly once for every `true`.
    pub fn take_due(&mut self, now: Instant, quiet_period: Duration) -> bool {
        if self.is_due(now, quiet_period) {
            self.pending = false;
            true
        } else {
            false
        }
    }
}
