// src/engine/event_handlers.rs

//! Classification of single raw events.
//!
//! Each function here decides, for one event on one registry entry, whether
//! the event qualifies for a notification and which registry updates the
//! event loop has to perform. Apart from checking whether a created path is
//! a directory, nothing here touches the backend or the filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::backend::{RawEvent, RawEventKind};
use crate::watch::inputs::TreeTarget;
use crate::watch::path_utils::{is_real_dir, relative_str};
use crate::watch::patterns::FileTreeElement;
use crate::watch::registry::{FileGroup, WatchContext, WatchEntry};

/// Registry work requested by an event.
#[derive(Debug, Clone)]
pub enum LoopCommand {
    /// A directory appeared inside a tree watched directory by directory.
    RegisterSubtree { tree: Arc<TreeTarget>, dir: PathBuf },
}

/// Result of handling one raw event.
#[derive(Debug, Default)]
pub struct EventStep {
    /// The event is relevant: mark a notification as pending.
    pub qualifies: bool,
    pub commands: Vec<LoopCommand>,
}

impl EventStep {
    fn qualifying() -> Self {
        Self {
            qualifies: true,
            commands: Vec::new(),
        }
    }
}

/// Handle one raw event queued on the handle of `entry`.
///
/// `per_directory` is `true` when trees are covered by one non-recursive
/// watch per directory, so new directories have to be registered here.
pub fn handle_raw_event(entry: &WatchEntry, event: &RawEvent, per_directory: bool) -> EventStep {
    if event.kind == RawEventKind::Overflow {
        debug!(dir = ?entry.path(), "overflow: events may have been lost");
        return EventStep::qualifying();
    }

    let Some(relative) = &event.relative else {
        return EventStep::default();
    };
    let full = entry.path().join(relative);

    if entry.contexts().is_empty() {
        warn!(path = ?full, "unmapped path");
        return EventStep::default();
    }

    let mut step = EventStep::default();
    for context in entry.contexts() {
        match context {
            WatchContext::Tree(tree) => {
                handle_tree_event(tree, &full, event.kind, per_directory, &mut step)
            }
            WatchContext::FileGroup(group) => {
                if handle_file_group_event(group, &full) {
                    step.qualifies = true;
                }
            }
        }
    }
    step
}

/// Exclude first, then optional subtree registration, then include.
///
/// Excluded paths are dropped before anything else so excluded directories
/// are never descended into.
pub fn handle_tree_event(
    tree: &Arc<TreeTarget>,
    full: &Path,
    kind: RawEventKind,
    per_directory: bool,
    step: &mut EventStep,
) {
    let Some(relative) = relative_str(tree.root(), full) else {
        debug!(path = ?full, root = ?tree.root(), "event path outside of tree root");
        return;
    };
    let is_dir = is_real_dir(full);
    let element = FileTreeElement {
        path: full,
        relative: &relative,
        is_dir,
    };

    if tree.is_excluded(&element) {
        trace!(rel = %relative, "excluded");
        return;
    }

    if kind == RawEventKind::Created && is_dir && per_directory {
        step.commands.push(LoopCommand::RegisterSubtree {
            tree: Arc::clone(tree),
            dir: full.to_path_buf(),
        });
    }

    if tree.is_included(&element) {
        trace!(rel = %relative, ?kind, "included change");
        step.qualifies = true;
    }
}

/// Only an exact member of the group qualifies.
pub fn handle_file_group_event(group: &FileGroup, full: &Path) -> bool {
    group.contains(full)
}
