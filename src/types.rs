use std::str::FromStr;
use serde::Deserialize;

/// How directory trees are turned into native watches.
///
/// - `Auto`: use native recursive watching when the backend supports it,
///   otherwise fall back to one non-recursive watch per directory (default).
/// - `Recursive`: always register a single recursive watch per tree root.
/// - `PerDirectory`: always walk the tree and watch every directory on its
///   own, registering new directories as they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStrategy {
    Auto,
    Recursive,
    PerDirectory,
}

impl WatchStrategy {
    /// Resolve `Auto` against what the backend can do.
    ///
    /// Returns `true` when trees should be covered by one recursive watch.
    pub fn use_recursive(self, backend_supports_recursive: bool) -> bool {
        match self {
            WatchStrategy::Auto => backend_supports_recursive,
            WatchStrategy::Recursive => true,
            WatchStrategy::PerDirectory => false,
        }
    }
}

impl Default for WatchStrategy {
    fn default() -> Self {
        WatchStrategy::Auto
    }
}

impl FromStr for WatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(WatchStrategy::Auto),
            "recursive" => Ok(WatchStrategy::Recursive),
            "per_directory" => Ok(WatchStrategy::PerDirectory),
            other => Err(format!(
                "invalid strategy: {other} (expected \"auto\", \"recursive\" or \"per_directory\")"
            )),
        }
    }
}
