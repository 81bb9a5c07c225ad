// src/watch/inputs.rs

//! What a watch session observes: filtered directory trees and single files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::Result;
use crate::watch::path_utils::{absolutize_dir, absolutize_file};
use crate::watch::patterns::{FileTreeElement, GlobPredicate, PathPredicate};

/// A directory subtree plus the filters deciding which paths in it matter.
#[derive(Clone)]
pub struct TreeTarget {
    root: PathBuf,
    include: Arc<dyn PathPredicate>,
    exclude: Arc<dyn PathPredicate>,
}

impl fmt::Debug for TreeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeTarget")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl TreeTarget {
    /// Watch everything below `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: absolutize_dir(root.as_ref()),
            include: Arc::new(|_: &FileTreeElement<'_>| true),
            exclude: Arc::new(|_: &FileTreeElement<'_>| false),
        }
    }

    /// Compile glob include/exclude lists, see [`GlobPredicate`].
    pub fn from_patterns(
        root: impl AsRef<Path>,
        include: &[String],
        exclude: &[String],
    ) -> Result<Self> {
        Ok(Self::new(root)
            .with_include(GlobPredicate::include(include)?)
            .with_exclude(GlobPredicate::exclude(exclude)?))
    }

    pub fn with_include(mut self, include: impl PathPredicate + 'static) -> Self {
        self.include = Arc::new(include);
        self
    }

    pub fn with_exclude(mut self, exclude: impl PathPredicate + 'static) -> Self {
        self.exclude = Arc::new(exclude);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_included(&self, element: &FileTreeElement<'_>) -> bool {
        self.include.is_satisfied_by(element)
    }

    pub fn is_excluded(&self, element: &FileTreeElement<'_>) -> bool {
        self.exclude.is_satisfied_by(element)
    }
}

/// A single file, watched through its parent directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileTarget {
    path: PathBuf,
}

impl FileTarget {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: absolutize_file(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory whose watch reports changes to this file.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// The full input set of one watch session.
#[derive(Debug, Clone, Default)]
pub struct WatchInputs {
    trees: Vec<Arc<TreeTarget>>,
    files: Vec<FileTarget>,
}

impl WatchInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(mut self, tree: TreeTarget) -> Self {
        self.add_tree(tree);
        self
    }

    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.add_file(file);
        self
    }

    pub fn add_tree(&mut self, tree: TreeTarget) {
        self.trees.push(Arc::new(tree));
    }

    pub fn add_file(&mut self, file: impl AsRef<Path>) {
        self.files.push(FileTarget::new(file));
    }

    pub fn trees(&self) -> &[Arc<TreeTarget>] {
        &self.trees
    }

    pub fn files(&self) -> &[FileTarget] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.files.is_empty()
    }
}
