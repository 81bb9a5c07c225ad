// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FileWatchError, Result};
use crate::watch::GlobPredicate;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::FileWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_inputs(cfg)?;
    validate_global_config(cfg)?;
    validate_trees(cfg)?;
    Ok(())
}

fn ensure_has_inputs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.tree.is_empty() && cfg.files.paths.is_empty() {
        return Err(FileWatchError::ConfigError(
            "config must contain at least one [[tree]] entry or a [files] path".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.poll_timeout_ms == 0 {
        return Err(FileWatchError::ConfigError(
            "[config].poll_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.stop_timeout_secs == 0 {
        return Err(FileWatchError::ConfigError(
            "[config].stop_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if let Some(cmd) = &cfg.config.on_change {
        if cmd.trim().is_empty() {
            return Err(FileWatchError::ConfigError(
                "[config].on_change must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_trees(cfg: &RawConfigFile) -> Result<()> {
    let patterns = [&cfg.default.include, &cfg.default.exclude]
        .into_iter()
        .chain(cfg.tree.iter().flat_map(|t| t.include.iter().chain(t.exclude.iter())));
    for list in patterns {
        GlobPredicate::include(list)?;
    }

    for (idx, tree) in cfg.tree.iter().enumerate() {
        if tree.root.as_os_str().is_empty() {
            return Err(FileWatchError::ConfigError(format!(
                "[[tree]] #{} has an empty root",
                idx + 1
            )));
        }
    }
    for path in &cfg.files.paths {
        if path.file_name().is_none() {
            return Err(FileWatchError::ConfigError(format!(
                "[files] entry {:?} does not name a file",
                path
            )));
        }
    }
    Ok(())
}
