// src/engine/event_loop.rs

//! The watch loop running on the session's worker thread.
//!
//! Polling → Handling → Debouncing → (loop) until the running flag clears.
//! The loop exclusively owns the backend, the registry and the pending
//! state; the only thing it shares with the service is the running flag.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::backend::{WatchBackend, WatchBatch};
use crate::engine::debounce::PendingNotification;
use crate::engine::event_handlers::{LoopCommand, handle_raw_event};
use crate::engine::{FileWatchEvent, FileWatchListener, WatcherId, WatcherOptions};
use crate::errors::{FileWatchError, Result};
use crate::watch::inputs::{TreeTarget, WatchInputs};
use crate::watch::registrar::TreeRegistrar;
use crate::watch::registry::WatchRegistry;

pub struct EventLoop {
    source: WatcherId,
    backend: Box<dyn WatchBackend>,
    inputs: WatchInputs,
    listener: Option<Arc<dyn FileWatchListener>>,
    running: Arc<AtomicBool>,
    options: WatcherOptions,
    /// Resolved from the strategy once the backend is known.
    recursive: bool,
    registry: WatchRegistry,
    pending: PendingNotification,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("source", &self.source)
            .field("recursive", &self.recursive)
            .field("registry", &self.registry)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl EventLoop {
    pub fn new(
        source: WatcherId,
        backend: Box<dyn WatchBackend>,
        inputs: WatchInputs,
        listener: Option<Arc<dyn FileWatchListener>>,
        running: Arc<AtomicBool>,
        options: WatcherOptions,
    ) -> Self {
        let recursive = options.strategy.use_recursive(backend.supports_recursive());
        Self {
            source,
            backend,
            inputs,
            listener,
            running,
            options,
            recursive,
            registry: WatchRegistry::new(),
            pending: PendingNotification::new(),
        }
    }

    /// Register the inputs, then watch until the running flag clears.
    ///
    /// A registration failure ends the session before the first poll. The
    /// backend is closed on every exit path.
    pub fn run(mut self) -> Result<()> {
        let result = self.register_inputs().map(|()| self.watch_loop());

        if let Err(err) = self.backend.close() {
            debug!(error = %err, "ignoring failure while closing watch backend");
        }
        debug!(source = %self.source, "watch loop finished");
        result
    }

    fn register_inputs(&mut self) -> Result<()> {
        let mut registrar = TreeRegistrar::new(self.backend.as_mut(), self.recursive);
        registrar
            .register_inputs(&self.inputs, &mut self.registry)
            .map_err(FileWatchError::RegisterInputs)?;

        info!(
            source = %self.source,
            trees = self.inputs.trees().len(),
            files = self.inputs.files().len(),
            handles = self.registry.len(),
            recursive = self.recursive,
            "watching inputs"
        );
        Ok(())
    }

    fn watch_loop(&mut self) {
        self.pending = PendingNotification::new();

        while self.running.load(Ordering::Acquire) {
            match self.backend.poll(self.options.poll_timeout) {
                Ok(Some(batch)) => self.handle_batch(batch),
                Ok(None) => {}
                Err(err) => {
                    error!(error = %err, "watch backend failed; leaving watch loop");
                    break;
                }
            }
            self.notify_if_quiet(Instant::now());
        }
    }

    fn handle_batch(&mut self, batch: WatchBatch) {
        let handle = batch.handle;
        let Some(entry) = self.registry.get(handle) else {
            debug!(%handle, "unmapped watch handle; cancelling");
            self.backend.cancel(handle);
            return;
        };
        let entry = entry.clone();

        debug!(%handle, dir = ?entry.path(), events = batch.events.len(), "handling watch batch");

        for event in &batch.events {
            let step = handle_raw_event(&entry, event, !self.recursive);
            for command in step.commands {
                self.execute_command(command);
            }
            if step.qualifies {
                self.pending.record(Instant::now());
            }
        }

        if !self.backend.reset(handle) {
            debug!(%handle, dir = ?entry.path(), "watch handle no longer valid; dropping");
            self.registry.remove(handle);
        }
    }

    fn execute_command(&mut self, command: LoopCommand) {
        match command {
            LoopCommand::RegisterSubtree { tree, dir } => self.register_subtree(&tree, &dir),
        }
    }

    /// Steady-state registration: failures are logged and otherwise ignored.
    fn register_subtree(&mut self, tree: &Arc<TreeTarget>, dir: &Path) {
        let mut registrar = TreeRegistrar::new(self.backend.as_mut(), self.recursive);
        match registrar.register_subtree(tree, dir, &mut self.registry) {
            Ok(count) => debug!(?dir, count, "registered new directories"),
            Err(err) => debug!(?dir, error = %err, "ignoring failure to watch new directory"),
        }
    }

    fn notify_if_quiet(&mut self, now: Instant) {
        if self.pending.take_due(now, self.options.quiet_period) {
            self.notify_changed();
        }
    }

    fn notify_changed(&self) {
        let event = FileWatchEvent {
            source: self.source,
        };
        let Some(listener) = &self.listener else {
            debug!(source = %self.source, "changes detected but no listener is set");
            return;
        };

        debug!(source = %self.source, "notifying listener");
        if catch_unwind(AssertUnwindSafe(|| listener.on_changes_detected(event))).is_err() {
            warn!(source = %self.source, "file watch listener panicked");
        }
    }
}
