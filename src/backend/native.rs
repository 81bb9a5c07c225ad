// src/backend/native.rs

//! `notify`-based implementation of [`WatchBackend`].
//!
//! `notify` delivers absolute paths through a callback running on its own
//! thread. The callback only forwards into a channel; all routing of paths
//! to handles happens inside `poll`, on the worker thread that owns the
//! backend.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use super::{RawEvent, RawEventKind, WatchBackend, WatchBatch, WatchHandle, WatchMode};

#[derive(Debug)]
struct NativeWatch {
    /// Canonical directory, the prefix `notify` reports events under.
    dir: PathBuf,
    mode: WatchMode,
    /// The directory itself went away; the next `reset` fails.
    stale: bool,
}

/// Native watch service on top of `notify::RecommendedWatcher`.
pub struct NativeBackend {
    watcher: RecommendedWatcher,
    events_rx: Receiver<notify::Result<Event>>,
    watches: HashMap<WatchHandle, NativeWatch>,
    by_dir: HashMap<PathBuf, WatchHandle>,
    /// Batches already routed but not yet handed out by `poll`.
    ready: VecDeque<WatchBatch>,
    next_id: u64,
}

impl std::fmt::Debug for NativeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBackend")
            .field("watches", &self.watches.len())
            .field("ready", &self.ready.len())
            .finish_non_exhaustive()
    }
}

impl NativeBackend {
    pub fn new() -> Result<Self> {
        let (events_tx, events_rx) = unbounded::<notify::Result<Event>>();

        // Called synchronously by notify whenever an event arrives. A send
        // error only means the session is over and the receiver is gone.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = events_tx.send(res);
            },
            Config::default(),
        )
        .context("creating native file watcher")?;

        Ok(Self {
            watcher,
            events_rx,
            watches: HashMap::new(),
            by_dir: HashMap::new(),
            ready: VecDeque::new(),
            next_id: 1,
        })
    }

    fn route(&mut self, res: notify::Result<Event>) {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, paths = ?err.paths, "native watch error");
                return;
            }
        };

        trace!(?event, "native event");

        if event.need_rescan() {
            let mut owners = event
                .paths
                .first()
                .map(|p| self.owners_of(p))
                .unwrap_or_default();
            if owners.is_empty() {
                owners.extend(self.watches.keys().min().copied());
            }
            for handle in owners {
                self.queue(handle, Some(RawEvent::overflow()));
            }
            return;
        }

        for (kind, path) in classify(&event) {
            if kind == RawEventKind::Deleted {
                self.mark_stale(&path);
            }

            let owners = self.owners_of(&path);
            if owners.is_empty() {
                trace!(?path, "event outside of any watched directory");
                continue;
            }
            for handle in owners {
                let Some(watch) = self.watches.get(&handle) else {
                    continue;
                };
                let Ok(relative) = path.strip_prefix(&watch.dir) else {
                    continue;
                };
                let relative = relative.to_path_buf();
                self.queue(
                    handle,
                    Some(RawEvent {
                        kind,
                        relative: Some(relative),
                    }),
                );
            }
        }
    }

    /// Every watch whose directory reports events for `path`: the direct
    /// parent, plus each recursively watched ancestor. Overlapping inputs
    /// (a file or a nested tree inside a recursive tree) all see the event.
    fn owners_of(&self, path: &Path) -> Vec<WatchHandle> {
        let Some(parent) = path.parent() else {
            return Vec::new();
        };
        path.ancestors()
            .skip(1)
            .filter_map(|ancestor| {
                let &handle = self.by_dir.get(ancestor)?;
                let watch = self.watches.get(&handle)?;
                (watch.mode == WatchMode::Recursive || ancestor == parent).then_some(handle)
            })
            .collect()
    }

    fn mark_stale(&mut self, path: &Path) {
        let Some(&handle) = self.by_dir.get(path) else {
            return;
        };
        if let Some(watch) = self.watches.get_mut(&handle) {
            if !watch.stale {
                debug!(%handle, dir = ?watch.dir, "watched directory removed");
                watch.stale = true;
            }
        }
        // Signal the handle so the owner calls `reset` and learns about it.
        self.queue(handle, None);
    }

    fn queue(&mut self, handle: WatchHandle, event: Option<RawEvent>) {
        if let Some(batch) = self.ready.iter_mut().find(|b| b.handle == handle) {
            batch.events.extend(event);
            return;
        }
        self.ready.push_back(WatchBatch {
            handle,
            events: event.into_iter().collect(),
        });
    }

    fn drop_watch(&mut self, handle: WatchHandle) {
        let Some(watch) = self.watches.remove(&handle) else {
            return;
        };
        self.by_dir.remove(&watch.dir);
        self.ready.retain(|b| b.handle != handle);
        // A deleted directory has already lost its native watch.
        if let Err(err) = self.watcher.unwatch(&watch.dir) {
            debug!(%handle, dir = ?watch.dir, error = %err, "unwatch failed");
        }
    }
}

/// Map a notify event to raw events, one per affected path.
fn classify(event: &Event) -> Vec<(RawEventKind, PathBuf)> {
    let all = |kind: RawEventKind| -> Vec<(RawEventKind, PathBuf)> {
        event.paths.iter().map(|p| (kind, p.clone())).collect()
    };

    match event.kind {
        EventKind::Create(_) => all(RawEventKind::Created),
        EventKind::Remove(_) => all(RawEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(RawEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(RawEventKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                out.push((RawEventKind::Deleted, from.clone()));
            }
            if let Some(to) = event.paths.get(1) {
                out.push((RawEventKind::Created, to.clone()));
            }
            out
        }
        // Direction unknown (e.g. FSEvents): decide by what is on disk now.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let kind = if p.symlink_metadata().is_ok() {
                    RawEventKind::Created
                } else {
                    RawEventKind::Deleted
                };
                (kind, p.clone())
            })
            .collect(),
        EventKind::Modify(_) => all(RawEventKind::Modified),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => all(RawEventKind::Modified),
        EventKind::Access(_) => Vec::new(),
        EventKind::Any | EventKind::Other => all(RawEventKind::Modified),
    }
}

impl WatchBackend for NativeBackend {
    fn supports_recursive(&self) -> bool {
        cfg!(any(target_os = "windows", target_os = "macos"))
    }

    fn register(&mut self, dir: &Path, mode: WatchMode) -> Result<WatchHandle> {
        let dir = dir
            .canonicalize()
            .with_context(|| format!("resolving watched directory {:?}", dir))?;

        if let Some(&existing) = self.by_dir.get(&dir) {
            if !self.watches[&existing].stale {
                return Ok(existing);
            }
            self.drop_watch(existing);
        }

        let recursive_mode = match mode {
            WatchMode::NonRecursive => RecursiveMode::NonRecursive,
            WatchMode::Recursive => RecursiveMode::Recursive,
        };
        self.watcher
            .watch(&dir, recursive_mode)
            .with_context(|| format!("watching directory {:?}", dir))?;

        let handle = WatchHandle::new(self.next_id);
        self.next_id += 1;
        debug!(%handle, ?dir, ?mode, "registered native watch");

        self.by_dir.insert(dir.clone(), handle);
        self.watches.insert(
            handle,
            NativeWatch {
                dir,
                mode,
                stale: false,
            },
        );
        Ok(handle)
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<WatchBatch>> {
        if let Some(batch) = self.ready.pop_front() {
            return Ok(Some(batch));
        }

        let first = match self.events_rx.recv_timeout(timeout) {
            Ok(res) => res,
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                bail!("native watcher stopped delivering events")
            }
        };
        self.route(first);
        while let Ok(res) = self.events_rx.try_recv() {
            self.route(res);
        }

        Ok(self.ready.pop_front())
    }

    fn reset(&mut self, handle: WatchHandle) -> bool {
        let valid = match self.watches.get(&handle) {
            Some(watch) => !watch.stale && watch.dir.is_dir(),
            None => return false,
        };
        if !valid {
            self.drop_watch(handle);
        }
        valid
    }

    fn cancel(&mut self, handle: WatchHandle) {
        self.drop_watch(handle);
    }

    fn close(&mut self) -> Result<()> {
        let handles: Vec<WatchHandle> = self.watches.keys().copied().collect();
        for handle in handles {
            self.drop_watch(handle);
        }
        self.ready.clear();
        Ok(())
    }
}
