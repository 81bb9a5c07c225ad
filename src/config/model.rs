// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::WatcherOptions;
use crate::errors::Result;
use crate::types::WatchStrategy;
use crate::watch::patterns::effective_patterns;
use crate::watch::{TreeTarget, WatchInputs};

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// quiet_period_ms = 1000
/// strategy = "auto"
///
/// [default]
/// include = ["**/*.rs"]
/// exclude = ["**/target/**"]
///
/// [[tree]]
/// root = "src"
///
/// [files]
/// paths = ["Cargo.toml"]
/// ```
///
/// All sections are optional and have reasonable defaults, but validation
/// requires at least one tree or file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// `[[tree]]` entries.
    #[serde(default)]
    pub tree: Vec<TreeConfig>,

    #[serde(default)]
    pub files: FilesSection,
}

/// `[config]` section: engine tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Idle time before a notification; `<= 0` disables debouncing.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: i64,

    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    #[serde(default)]
    pub strategy: WatchStrategy,

    /// Shell command run after each notification.
    #[serde(default)]
    pub on_change: Option<String>,
}

fn default_quiet_period_ms() -> i64 {
    1000
}

fn default_poll_timeout_ms() -> u64 {
    250
}

fn default_stop_timeout_secs() -> u64 {
    10
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
            poll_timeout_ms: default_poll_timeout_ms(),
            stop_timeout_secs: default_stop_timeout_secs(),
            strategy: WatchStrategy::default(),
            on_change: None,
        }
    }
}

/// `[default]` section: patterns for trees that don't bring their own.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// One `[[tree]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeConfig {
    /// Tree root; relative roots resolve against the config directory.
    pub root: PathBuf,

    /// If `None`, the tree uses `default.include`.
    #[serde(default)]
    pub include: Option<Vec<String>>,

    /// If `None`, the tree uses `default.exclude`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// If true, `default.include` is appended to `include`.
    #[serde(default)]
    pub append_default_include: bool,

    /// If true, `default.exclude` is appended to `exclude`.
    #[serde(default)]
    pub append_default_exclude: bool,
}

/// `[files]` section: individually watched files.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FilesSection {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Validated configuration. Construct through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub default: DefaultSection,
    pub tree: Vec<TreeConfig>,
    pub files: FilesSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            default: raw.default,
            tree: raw.tree,
            files: raw.files,
        }
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    pub fn trees(&self) -> &[TreeConfig] {
        &self.tree
    }

    /// Effective `(include, exclude)` lists of one tree.
    pub fn tree_patterns(&self, tree: &TreeConfig) -> (Vec<String>, Vec<String>) {
        (
            effective_patterns(
                tree.include.as_ref(),
                &self.default.include,
                tree.append_default_include,
            ),
            effective_patterns(
                tree.exclude.as_ref(),
                &self.default.exclude,
                tree.append_default_exclude,
            ),
        )
    }

    pub fn watcher_options(&self) -> WatcherOptions {
        let quiet_ms = u64::try_from(self.config.quiet_period_ms).unwrap_or(0);
        WatcherOptions {
            quiet_period: Duration::from_millis(quiet_ms),
            poll_timeout: Duration::from_millis(self.config.poll_timeout_ms),
            stop_timeout: Duration::from_secs(self.config.stop_timeout_secs),
            strategy: self.config.strategy,
        }
    }

    /// Build the watch inputs, resolving relative paths against `base`.
    pub fn watch_inputs(&self, base: &Path) -> Result<WatchInputs> {
        let mut inputs = WatchInputs::new();
        for tree in &self.tree {
            let (include, exclude) = self.tree_patterns(tree);
            let root = base.join(&tree.root);
            inputs.add_tree(TreeTarget::from_patterns(root, &include, &exclude)?);
        }
        for file in &self.files.paths {
            inputs.add_file(base.join(file));
        }
        Ok(inputs)
    }
}
