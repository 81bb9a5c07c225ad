// src/watch/registrar.rs

//! Turns watch inputs into native watches.
//!
//! With native recursive watching a tree costs one handle on its root.
//! Without it, every directory of the tree gets its own non-recursive
//! handle; the walk only sees what exists right now, directories created
//! later are registered by the event loop as their creation events arrive.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use crate::backend::{WatchBackend, WatchMode};
use crate::watch::inputs::{FileTarget, TreeTarget, WatchInputs};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::FileTreeElement;
use crate::watch::registry::{FileGroup, WatchContext, WatchRegistry};

pub struct TreeRegistrar<'a> {
    backend: &'a mut dyn WatchBackend,
    recursive: bool,
}

impl<'a> TreeRegistrar<'a> {
    pub fn new(backend: &'a mut dyn WatchBackend, recursive: bool) -> Self {
        Self { backend, recursive }
    }

    /// Register every tree and file of `inputs`.
    pub fn register_inputs(
        &mut self,
        inputs: &WatchInputs,
        registry: &mut WatchRegistry,
    ) -> Result<()> {
        for tree in inputs.trees() {
            self.register_tree(tree, registry)?;
        }
        self.register_files(inputs.files(), registry)?;
        debug!(handles = registry.len(), "registered watch inputs");
        Ok(())
    }

    pub fn register_tree(
        &mut self,
        tree: &Arc<TreeTarget>,
        registry: &mut WatchRegistry,
    ) -> Result<()> {
        if self.recursive {
            let handle = self
                .backend
                .register(tree.root(), WatchMode::Recursive)
                .with_context(|| format!("registering tree {:?}", tree.root()))?;
            registry.insert(handle, tree.root(), WatchContext::Tree(Arc::clone(tree)));
            return Ok(());
        }
        self.register_subtree(tree, tree.root(), registry)
            .map(|_| ())
    }

    /// Register `dir` and every directory below it that the tree does not
    /// exclude. Returns how many directories were registered.
    pub fn register_subtree(
        &mut self,
        tree: &Arc<TreeTarget>,
        dir: &Path,
        registry: &mut WatchRegistry,
    ) -> Result<usize> {
        let walk = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.file_type().is_dir()
                    && (entry.depth() == 0 || !excluded_dir(tree, entry.path()))
            });

        let mut registered = 0;
        for entry in walk {
            let entry = entry.with_context(|| format!("walking directory tree {:?}", dir))?;
            let handle = self
                .backend
                .register(entry.path(), WatchMode::NonRecursive)
                .with_context(|| format!("registering directory {:?}", entry.path()))?;
            registry.insert(handle, entry.path(), WatchContext::Tree(Arc::clone(tree)));
            registered += 1;
        }
        Ok(registered)
    }

    /// One non-recursive handle per distinct parent directory.
    pub fn register_files(
        &mut self,
        files: &[FileTarget],
        registry: &mut WatchRegistry,
    ) -> Result<()> {
        for group in group_by_parent(files) {
            let parent = group.parent().to_path_buf();
            let handle = self
                .backend
                .register(&parent, WatchMode::NonRecursive)
                .with_context(|| format!("registering parent directory {:?}", parent))?;
            registry.insert(handle, parent, WatchContext::FileGroup(Arc::new(group)));
        }
        Ok(())
    }
}

/// Group files by parent directory, keeping first-sight order.
pub fn group_by_parent(files: &[FileTarget]) -> Vec<FileGroup> {
    let mut groups: Vec<FileGroup> = Vec::new();
    for file in files {
        match groups.iter_mut().find(|g| g.parent() == file.parent()) {
            Some(group) => group.add(file.path()),
            None => {
                let mut group = FileGroup::new(file.parent());
                group.add(file.path());
                groups.push(group);
            }
        }
    }
    groups
}

fn excluded_dir(tree: &TreeTarget, path: &Path) -> bool {
    let Some(relative) = relative_str(tree.root(), path) else {
        return false;
    };
    tree.is_excluded(&FileTreeElement {
        path,
        relative: &relative,
        is_dir: true,
    })
}
