// src/watch/patterns.rs

//! Include / exclude predicates for directory trees.
//!
//! The event loop only needs a yes/no answer for a candidate path, so trees
//! hold their filters as [`PathPredicate`] trait objects. [`GlobPredicate`]
//! is the implementation the config file compiles patterns into; tests and
//! embedders can pass closures instead.

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// A candidate path handed to a predicate.
#[derive(Debug, Clone, Copy)]
pub struct FileTreeElement<'a> {
    /// Absolute path of the candidate.
    pub path: &'a Path,
    /// Path relative to the tree root, `/`-separated (`""` for the root).
    pub relative: &'a str,
    /// Whether the candidate currently is a directory on disk.
    pub is_dir: bool,
}

/// "Does this path match?" capability used for include and exclude filters.
pub trait PathPredicate: Send + Sync {
    fn is_satisfied_by(&self, element: &FileTreeElement<'_>) -> bool;
}

impl<F> PathPredicate for F
where
    F: Fn(&FileTreeElement<'_>) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, element: &FileTreeElement<'_>) -> bool {
        self(element)
    }
}

/// Compiled glob patterns, evaluated against the tree-relative path.
///
/// `*` and `?` never cross a `/`; `**` spans any number of directories.
///
/// An *include* predicate without patterns matches everything. An *exclude*
/// predicate without patterns matches nothing, so nothing is excluded. With
/// patterns it also matches every path below a matching directory: excluding
/// `build` hides `build/out/a.o` as well. A trailing `/**` in an exclude
/// pattern also matches the directory itself, so `**/tmp/**` excludes `tmp`.
#[derive(Clone)]
pub struct GlobPredicate {
    patterns: Vec<String>,
    set: GlobSet,
    when_empty: bool,
    match_ancestors: bool,
}

impl fmt::Debug for GlobPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobPredicate")
            .field("patterns", &self.patterns)
            .field("match_ancestors", &self.match_ancestors)
            .finish_non_exhaustive()
    }
}

impl GlobPredicate {
    /// Include filter: empty pattern list means "include everything".
    pub fn include(patterns: &[String]) -> Result<Self> {
        Self::build(patterns, true, false)
    }

    /// Exclude filter: empty pattern list means "exclude nothing".
    pub fn exclude(patterns: &[String]) -> Result<Self> {
        Self::build(patterns, false, true)
    }

    fn build(patterns: &[String], when_empty: bool, match_ancestors: bool) -> Result<Self> {
        let set = if match_ancestors {
            build_globset(&with_bare_dirs(patterns))?
        } else {
            build_globset(patterns)?
        };
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
            when_empty,
            match_ancestors,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Match a `/`-separated path relative to the tree root.
    pub fn is_match(&self, relative: &str) -> bool {
        if self.patterns.is_empty() {
            return self.when_empty;
        }
        if self.set.is_match(relative) {
            return true;
        }
        self.match_ancestors
            && relative
                .match_indices('/')
                .any(|(idx, _)| self.set.is_match(&relative[..idx]))
    }
}

impl PathPredicate for GlobPredicate {
    fn is_satisfied_by(&self, element: &FileTreeElement<'_>) -> bool {
        self.is_match(element.relative)
    }
}

/// Decide the effective pattern list for one dimension (include or exclude).
///
/// - `append_default = true`: tree list followed by the default list.
/// - Else, if the tree has its own list, use only that.
/// - Else, use the default list.
pub fn effective_patterns(
    own: Option<&Vec<String>>,
    defaults: &[String],
    append_default: bool,
) -> Vec<String> {
    match (own, append_default) {
        (Some(list), true) => {
            let mut combined = list.clone();
            combined.extend(defaults.iter().cloned());
            combined
        }
        (Some(list), false) => list.clone(),
        (None, _) => defaults.to_vec(),
    }
}

/// `dir/**` only matches below `dir`; add `dir` itself for every such pattern.
fn with_bare_dirs(patterns: &[String]) -> Vec<String> {
    let mut out = patterns.to_vec();
    for pat in patterns {
        if let Some(dir) = pat.strip_suffix("/**") {
            if !dir.is_empty() && !out.iter().any(|p| p == dir) {
                out.push(dir.to_string());
            }
        }
    }
    out
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat).literal_separator(true).build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
