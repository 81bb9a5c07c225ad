// src/watch/registry.rs

//! Native watch handle → watch context index.
//!
//! Owned by the event loop of one session; nothing else mutates it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::WatchHandle;
use crate::watch::inputs::TreeTarget;

/// Files sharing one parent directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    parent: PathBuf,
    /// First-sight order, without duplicates.
    files: Vec<PathBuf>,
}

impl FileGroup {
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: parent.into(),
            files: Vec::new(),
        }
    }

    pub fn add(&mut self, file: impl Into<PathBuf>) {
        let file = file.into();
        if !self.files.contains(&file) {
            self.files.push(file);
        }
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Exact membership; no prefix or pattern matching.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// Why a directory is watched.
#[derive(Debug, Clone)]
pub enum WatchContext {
    /// One directory of a watched tree (or its root, when recursive).
    Tree(Arc<TreeTarget>),
    /// Parent directory of individually watched files.
    FileGroup(Arc<FileGroup>),
}

impl WatchContext {
    fn same_as(&self, other: &WatchContext) -> bool {
        match (self, other) {
            (WatchContext::Tree(a), WatchContext::Tree(b)) => Arc::ptr_eq(a, b),
            (WatchContext::FileGroup(a), WatchContext::FileGroup(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Registry entry for one live handle.
///
/// A directory can be covered by several inputs (nested trees, a watched
/// file inside a watched tree) while the backend hands out a single handle
/// per directory, so an entry keeps every context registered for it.
#[derive(Debug, Clone)]
pub struct WatchEntry {
    path: PathBuf,
    contexts: Vec<WatchContext>,
}

impl WatchEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contexts(&self) -> &[WatchContext] {
        &self.contexts
    }
}

#[derive(Debug, Default)]
pub struct WatchRegistry {
    entries: HashMap<WatchHandle, WatchEntry>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `handle` watches `path` on behalf of `context`.
    pub fn insert(&mut self, handle: WatchHandle, path: impl Into<PathBuf>, context: WatchContext) {
        let entry = self.entries.entry(handle).or_insert_with(|| WatchEntry {
            path: path.into(),
            contexts: Vec::new(),
        });
        if !entry.contexts.iter().any(|c| c.same_as(&context)) {
            entry.contexts.push(context);
        }
    }

    /// `None` means the handle is unmapped.
    pub fn get(&self, handle: WatchHandle) -> Option<&WatchEntry> {
        self.entries.get(&handle)
    }

    pub fn remove(&mut self, handle: WatchHandle) -> Option<WatchEntry> {
        self.entries.remove(&handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
