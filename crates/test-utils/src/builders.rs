#![allow(dead_code)]

use std::path::PathBuf;

use treewatch::config::{
    ConfigFile, ConfigSection, DefaultSection, FilesSection, RawConfigFile, TreeConfig,
};
use treewatch::types::WatchStrategy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                default: DefaultSection::default(),
                tree: Vec::new(),
                files: FilesSection::default(),
            },
        }
    }

    pub fn with_tree(mut self, tree: TreeConfig) -> Self {
        self.config.tree.push(tree);
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.files.paths.push(path.into());
        self
    }

    pub fn with_default_include(mut self, pattern: &str) -> Self {
        self.config.default.include.push(pattern.to_string());
        self
    }

    pub fn with_default_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn with_quiet_period_ms(mut self, ms: i64) -> Self {
        self.config.config.quiet_period_ms = ms;
        self
    }

    pub fn with_poll_timeout_ms(mut self, ms: u64) -> Self {
        self.config.config.poll_timeout_ms = ms;
        self
    }

    pub fn with_strategy(mut self, strategy: WatchStrategy) -> Self {
        self.config.config.strategy = strategy;
        self
    }

    pub fn with_on_change(mut self, cmd: &str) -> Self {
        self.config.config.on_change = Some(cmd.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TreeConfig`.
pub struct TreeConfigBuilder {
    tree: TreeConfig,
}

impl TreeConfigBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            tree: TreeConfig {
                root: root.into(),
                include: None,
                exclude: None,
                append_default_include: false,
                append_default_exclude: false,
            },
        }
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.tree
            .include
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.tree
            .exclude
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn append_default_include(mut self) -> Self {
        self.tree.append_default_include = true;
        self
    }

    pub fn append_default_exclude(mut self) -> Self {
        self.tree.append_default_exclude = true;
        self
    }

    pub fn build(self) -> TreeConfig {
        self.tree
    }
}
