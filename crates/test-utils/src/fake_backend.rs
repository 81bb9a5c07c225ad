use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{bail, Result};
use treewatch::backend::{
    RawEvent, SharedBackendFactory, WatchBackend, WatchBatch, WatchHandle, WatchMode,
};

#[derive(Debug, Default)]
struct ProbeState {
    next_id: u64,
    registrations: Vec<(PathBuf, WatchMode)>,
    by_dir: HashMap<PathBuf, WatchHandle>,
    queued: VecDeque<WatchBatch>,
    polls: usize,
    resets: Vec<WatchHandle>,
    cancels: Vec<WatchHandle>,
    invalid: HashSet<WatchHandle>,
    fail_register: bool,
    fail_next_poll: bool,
    stall: Option<Duration>,
    sessions: usize,
    closed: bool,
}

/// Shared view into a [`ScriptedBackend`].
///
/// Tests keep a clone to script batches and to inspect what the event loop
/// did with the backend from the worker thread.
#[derive(Debug, Clone, Default)]
pub struct BackendProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl BackendProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProbeState> {
        self.state.lock().unwrap()
    }

    /// Queue a batch for the next poll.
    pub fn push_batch(&self, handle: WatchHandle, events: Vec<RawEvent>) {
        self.lock().queued.push_back(WatchBatch { handle, events });
    }

    /// Queue a batch on the handle registered for `dir`.
    ///
    /// Panics if `dir` was never registered.
    pub fn push_for_dir(&self, dir: impl AsRef<Path>, events: Vec<RawEvent>) {
        let handle = self
            .handle_for(dir.as_ref())
            .unwrap_or_else(|| panic!("{:?} is not registered", dir.as_ref()));
        self.push_batch(handle, events);
    }

    pub fn handle_for(&self, dir: impl AsRef<Path>) -> Option<WatchHandle> {
        self.lock().by_dir.get(dir.as_ref()).copied()
    }

    /// Every successful `register` call in order, repeats included.
    pub fn registrations(&self) -> Vec<(PathBuf, WatchMode)> {
        self.lock().registrations.clone()
    }

    pub fn registered_dirs(&self) -> Vec<PathBuf> {
        self.lock()
            .registrations
            .iter()
            .map(|(dir, _)| dir.clone())
            .collect()
    }

    pub fn is_registered(&self, dir: impl AsRef<Path>) -> bool {
        self.lock().by_dir.contains_key(dir.as_ref())
    }

    pub fn poll_count(&self) -> usize {
        self.lock().polls
    }

    /// Whether every scripted batch has been handed out.
    pub fn is_drained(&self) -> bool {
        self.lock().queued.is_empty()
    }

    pub fn resets(&self) -> Vec<WatchHandle> {
        self.lock().resets.clone()
    }

    pub fn cancels(&self) -> Vec<WatchHandle> {
        self.lock().cancels.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// How many backends the factory has created.
    pub fn sessions(&self) -> usize {
        self.lock().sessions
    }

    /// Make `reset` report `handle` as no longer valid.
    pub fn invalidate(&self, handle: WatchHandle) {
        self.lock().invalid.insert(handle);
    }

    /// Make every `register` call fail.
    pub fn fail_registration(&self) {
        self.lock().fail_register = true;
    }

    /// Make the next `poll` return an error.
    pub fn fail_next_poll(&self) {
        self.lock().fail_next_poll = true;
    }

    /// Make every `poll` block for `stall`, ignoring its timeout.
    pub fn stall_polls(&self, stall: Duration) {
        self.lock().stall = Some(stall);
    }

    /// Factory handing out scripted backends that share this probe.
    pub fn factory(&self, supports_recursive: bool) -> SharedBackendFactory {
        let probe = self.clone();
        Arc::new(move || -> Result<Box<dyn WatchBackend>> {
            probe.lock().sessions += 1;
            Ok(Box::new(ScriptedBackend::new(probe.clone(), supports_recursive)))
        })
    }
}

/// A fake backend that:
/// - hands out sequential handles, one per distinct directory
/// - replays batches queued on its [`BackendProbe`]
/// - records registrations, polls, resets, cancels and close.
#[derive(Debug)]
pub struct ScriptedBackend {
    probe: BackendProbe,
    supports_recursive: bool,
}

impl ScriptedBackend {
    pub fn new(probe: BackendProbe, supports_recursive: bool) -> Self {
        Self {
            probe,
            supports_recursive,
        }
    }
}

impl WatchBackend for ScriptedBackend {
    fn supports_recursive(&self) -> bool {
        self.supports_recursive
    }

    fn register(&mut self, dir: &Path, mode: WatchMode) -> Result<WatchHandle> {
        let mut state = self.probe.lock();
        if state.fail_register {
            bail!("scripted registration failure for {:?}", dir);
        }
        state.registrations.push((dir.to_path_buf(), mode));
        if let Some(handle) = state.by_dir.get(dir) {
            return Ok(*handle);
        }
        state.next_id += 1;
        let handle = WatchHandle::new(state.next_id);
        state.by_dir.insert(dir.to_path_buf(), handle);
        Ok(handle)
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<WatchBatch>> {
        let stall = {
            let mut state = self.probe.lock();
            state.polls += 1;
            if state.fail_next_poll {
                state.fail_next_poll = false;
                bail!("scripted poll failure");
            }
            if let Some(batch) = state.queued.pop_front() {
                return Ok(Some(batch));
            }
            state.stall
        };
        std::thread::sleep(stall.unwrap_or(timeout));
        Ok(None)
    }

    fn reset(&mut self, handle: WatchHandle) -> bool {
        let mut state = self.probe.lock();
        state.resets.push(handle);
        if state.invalid.contains(&handle) {
            state.by_dir.retain(|_, h| *h != handle);
            return false;
        }
        true
    }

    fn cancel(&mut self, handle: WatchHandle) {
        let mut state = self.probe.lock();
        state.cancels.push(handle);
        state.by_dir.retain(|_, h| *h != handle);
    }

    fn close(&mut self) -> Result<()> {
        self.probe.lock().closed = true;
        Ok(())
    }
}
