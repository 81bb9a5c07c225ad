// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    // Different absolute prefixes may name the same directory (symlinks,
    // /private/var on macOS, ...).
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Absolute form of a directory: canonical when it exists, otherwise made
/// absolute against the current directory.
pub fn absolutize_dir(dir: &Path) -> PathBuf {
    dir.canonicalize()
        .or_else(|_| std::path::absolute(dir))
        .unwrap_or_else(|_| dir.to_path_buf())
}

/// Absolute form of a file that may not exist yet.
///
/// The parent directory is resolved like [`absolutize_dir`] and the file
/// name is appended, so a watched file compares equal to the paths events
/// are reported under whether or not it exists at startup.
pub fn absolutize_file(file: &Path) -> PathBuf {
    match (file.parent(), file.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            absolutize_dir(parent).join(name)
        }
        _ => absolutize_dir(file),
    }
}

/// `true` if `path` is a directory, without following a final symlink.
pub fn is_real_dir(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
