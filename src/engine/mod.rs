// src/engine/mod.rs

//! Watch engine for treewatch.
//!
//! This module ties together:
//! - the pending-notification debounce clock
//! - per-event classification against tree filters and file groups
//! - the event loop that polls the backend on a blocking worker thread
//!
//! The decision logic for a single raw event lives in [`event_handlers`]
//! and has no backend or threading concerns; [`event_loop`] is the shell
//! that polls, registers and delivers.

use std::fmt;
use std::time::Duration;

use crate::types::WatchStrategy;

pub mod debounce;
pub mod event_handlers;
pub mod event_loop;

pub use debounce::PendingNotification;
pub use event_handlers::{EventStep, LoopCommand};
pub use event_loop::EventLoop;

/// Idle time after the last qualifying event before listeners are notified.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);
/// Upper bound for one blocking backend poll; also bounds shutdown latency.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(250);
/// How long `stop()` waits for the worker.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies the service a notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(pub u64);

impl fmt::Display for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watcher-{}", self.0)
    }
}

/// Delivered to the listener when something relevant changed.
///
/// Intentionally carries no paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileWatchEvent {
    pub source: WatcherId,
}

/// The single sink for change notifications.
pub trait FileWatchListener: Send + Sync {
    fn on_changes_detected(&self, event: FileWatchEvent);
}

impl<F> FileWatchListener for F
where
    F: Fn(FileWatchEvent) + Send + Sync,
{
    fn on_changes_detected(&self, event: FileWatchEvent) {
        self(event)
    }
}

/// Tunables of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Zero delivers on the first loop iteration after an event.
    pub quiet_period: Duration,
    pub poll_timeout: Duration,
    pub stop_timeout: Duration,
    pub strategy: WatchStrategy,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            strategy: WatchStrategy::Auto,
        }
    }
}

impl WatcherOptions {
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn with_strategy(mut self, strategy: WatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
