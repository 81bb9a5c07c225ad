// src/service.rs

//! The externally visible watch service.
//!
//! `FileWatchService` owns the session state: the running flag shared with
//! the worker and the join handle of the worker. `start` and `stop` are
//! serialised by one async mutex; the worker only ever reads the flag.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Context;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend::{NativeBackendFactory, SharedBackendFactory};
use crate::engine::{EventLoop, FileWatchListener, WatcherId, WatcherOptions};
use crate::errors::{FileWatchError, Result};
use crate::watch::WatchInputs;

static NEXT_WATCHER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct Session {
    inputs: WatchInputs,
    listener: Option<Arc<dyn FileWatchListener>>,
    worker: Option<JoinHandle<Result<()>>>,
}

/// Watches one input set for one listener at a time.
pub struct FileWatchService {
    id: WatcherId,
    options: WatcherOptions,
    factory: SharedBackendFactory,
    running: Arc<AtomicBool>,
    session: Mutex<Session>,
}

impl fmt::Debug for FileWatchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWatchService")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl FileWatchService {
    /// Service backed by the platform's native watcher.
    pub fn new(options: WatcherOptions) -> Self {
        Self::with_backend(options, Arc::new(NativeBackendFactory))
    }

    /// Service using `factory` to create one backend per session.
    pub fn with_backend(options: WatcherOptions, factory: SharedBackendFactory) -> Self {
        Self {
            id: WatcherId(NEXT_WATCHER_ID.fetch_add(1, Ordering::Relaxed)),
            options,
            factory,
            running: Arc::new(AtomicBool::new(false)),
            session: Mutex::new(Session::default()),
        }
    }

    pub fn id(&self) -> WatcherId {
        self.id
    }

    pub fn options(&self) -> &WatcherOptions {
        &self.options
    }

    /// Whether a session was started and not yet stopped.
    ///
    /// This tracks the caller's `start`/`stop` calls, not the worker: a
    /// session whose worker already ended (failed registration, a dead
    /// backend) still reports `true` until `stop()` reaps it.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Replace the directories and files to watch.
    ///
    /// Ignored while a session is running; the next `start` picks it up.
    pub async fn set_watch_inputs(&self, inputs: WatchInputs) {
        let mut session = self.session.lock().await;
        if self.is_running() {
            warn!(source = %self.id, "ignoring new watch inputs while running");
            return;
        }
        session.inputs = inputs;
    }

    /// Replace the listener. The listener set when `start` runs serves that
    /// session.
    pub async fn set_listener(&self, listener: impl FileWatchListener + 'static) {
        let mut session = self.session.lock().await;
        session.listener = Some(Arc::new(listener));
    }

    /// Start watching on a background worker.
    ///
    /// Fails with [`FileWatchError::AlreadyRunning`] if a session is active;
    /// the active session is not affected.
    pub async fn start(&self) -> Result<()> {
        let mut session = self.session.lock().await;

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FileWatchError::AlreadyRunning);
        }

        let source = self.id;
        let factory = Arc::clone(&self.factory);
        let inputs = session.inputs.clone();
        let listener = session.listener.clone();
        let running = Arc::clone(&self.running);
        let options = self.options;

        let worker = tokio::task::spawn_blocking(move || {
            let backend = factory.create().context("creating watch backend")?;
            EventLoop::new(source, backend, inputs, listener, running, options).run()
        });
        session.worker = Some(worker);

        info!(source = %self.id, "file watcher started");
        Ok(())
    }

    /// Stop the running session and wait for the worker.
    ///
    /// No-op when not running. Worker failures are logged and swallowed;
    /// only a worker that outlives the stop timeout is reported, as
    /// [`FileWatchError::StopTimeout`]. In that case the worker may still be
    /// running.
    pub async fn stop(&self) -> Result<()> {
        let mut session = self.session.lock().await;

        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let Some(worker) = session.worker.take() else {
            return Ok(());
        };

        match tokio::time::timeout(self.options.stop_timeout, worker).await {
            Ok(Ok(Ok(()))) => info!(source = %self.id, "file watcher stopped"),
            Ok(Ok(Err(err))) => {
                warn!(source = %self.id, error = %err, "file watcher worker failed; stopped anyway")
            }
            Ok(Err(join_err)) => {
                warn!(source = %self.id, error = %join_err, "file watcher worker did not complete")
            }
            Err(_elapsed) => {
                error!(
                    source = %self.id,
                    timeout = ?self.options.stop_timeout,
                    "file watcher did not stop in time"
                );
                return Err(FileWatchError::StopTimeout(self.options.stop_timeout));
            }
        }
        Ok(())
    }
}

impl Drop for FileWatchService {
    fn drop(&mut self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!(source = %self.id, "service dropped while running; worker will exit");
        }
    }
}
