// src/backend/mod.rs

//! Pluggable native watch backend abstraction.
//!
//! The event loop talks to a `WatchBackend` instead of `notify` directly.
//! The model is key based: every registered directory gets a
//! [`WatchHandle`], `poll` hands back the queued raw events of one handle at
//! a time, and a handle has to be re-armed with `reset` after its batch was
//! processed.
//!
//! - [`native::NativeBackend`] is the production implementation on top of
//!   `notify::RecommendedWatcher`.
//! - Tests can provide their own backend that replays scripted batches.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

pub mod native;

pub use native::NativeBackend;

/// Opaque token for one registered watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(u64);

impl WatchHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a watch covers only the directory itself or its whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    NonRecursive,
    Recursive,
}

/// Kind of a raw filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    Created,
    Modified,
    Deleted,
    /// Some events may have been lost; the real change set is unknown.
    Overflow,
}

/// One raw event, relative to the directory of the handle it was queued on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawEventKind,
    /// `None` for `Overflow`.
    pub relative: Option<PathBuf>,
}

impl RawEvent {
    pub fn created(relative: impl Into<PathBuf>) -> Self {
        Self {
            kind: RawEventKind::Created,
            relative: Some(relative.into()),
        }
    }

    pub fn modified(relative: impl Into<PathBuf>) -> Self {
        Self {
            kind: RawEventKind::Modified,
            relative: Some(relative.into()),
        }
    }

    pub fn deleted(relative: impl Into<PathBuf>) -> Self {
        Self {
            kind: RawEventKind::Deleted,
            relative: Some(relative.into()),
        }
    }

    pub fn overflow() -> Self {
        Self {
            kind: RawEventKind::Overflow,
            relative: None,
        }
    }
}

/// All events queued on one handle since it was last re-armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBatch {
    pub handle: WatchHandle,
    pub events: Vec<RawEvent>,
}

/// Trait abstracting the OS change-notification API.
///
/// A backend is created on the worker and used from that thread only.
pub trait WatchBackend: Send {
    /// Whether the platform can watch a whole subtree with one registration.
    fn supports_recursive(&self) -> bool;

    /// Register a watch on `dir`.
    ///
    /// Registering a directory that is already watched returns its existing
    /// handle.
    fn register(&mut self, dir: &Path, mode: WatchMode) -> Result<WatchHandle>;

    /// Wait up to `timeout` for the next batch. `Ok(None)` means nothing
    /// happened in time; an error means the backend is unusable.
    fn poll(&mut self, timeout: Duration) -> Result<Option<WatchBatch>>;

    /// Re-arm `handle` after its batch was processed.
    ///
    /// Returns `false` when the handle is no longer valid (for example its
    /// directory was deleted); the backend has dropped it in that case.
    fn reset(&mut self, handle: WatchHandle) -> bool;

    /// Stop watching `handle`. Unknown handles are ignored.
    fn cancel(&mut self, handle: WatchHandle);

    /// Release every native resource.
    fn close(&mut self) -> Result<()>;
}

/// Creates a fresh backend for each watch session.
pub trait BackendFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn WatchBackend>>;
}

impl<F> BackendFactory for F
where
    F: Fn() -> Result<Box<dyn WatchBackend>> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn WatchBackend>> {
        self()
    }
}

/// Factory producing [`NativeBackend`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackendFactory;

impl BackendFactory for NativeBackendFactory {
    fn create(&self) -> Result<Box<dyn WatchBackend>> {
        Ok(Box::new(NativeBackend::new()?))
    }
}

/// Shared factory handle as stored by the service.
pub type SharedBackendFactory = Arc<dyn BackendFactory>;
