// src/lib.rs

pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod service;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{config_root_dir, load_and_validate};
use crate::config::model::ConfigFile;

pub use crate::engine::{FileWatchEvent, FileWatchListener, WatcherId, WatcherOptions};
pub use crate::errors::FileWatchError;
pub use crate::service::FileWatchService;
pub use crate::types::WatchStrategy;
pub use crate::watch::{TreeTarget, WatchInputs};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the watch service on the native backend
/// - the `on_change` hook
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root_dir = config_root_dir(&config_path);

    if args.dry_run {
        print_dry_run(&cfg, &root_dir);
        return Ok(());
    }

    let inputs = cfg.watch_inputs(&root_dir)?;
    let service = FileWatchService::new(cfg.watcher_options());
    service.set_watch_inputs(inputs).await;

    let (tx, mut rx) = mpsc::unbounded_channel::<FileWatchEvent>();
    service
        .set_listener(move |event: FileWatchEvent| {
            let _ = tx.send(event);
        })
        .await;

    service.start().await?;
    info!(root = %root_dir.display(), "watching for changes (Ctrl-C to stop)");

    let mut notifications: u64 = 0;
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    warn!("listener channel closed");
                    break;
                };
                notifications += 1;
                debug!(source = %event.source, notification = notifications, "notification received");
                println!("[treewatch] changes detected (#{notifications})");

                if let Some(cmd) = cfg.config.on_change.as_deref() {
                    if let Err(err) = exec::run_hook(cmd, notifications).await {
                        warn!(error = %err, "on_change hook could not run");
                    }
                }

                if args.once {
                    break;
                }
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                }
                info!("shutdown requested");
                break;
            }
        }
    }

    service.stop().await?;
    Ok(())
}

/// Simple dry-run output: print options and resolved inputs.
fn print_dry_run(cfg: &ConfigFile, root_dir: &Path) {
    let options = cfg.watcher_options();
    println!("treewatch dry-run");
    println!("  config.quiet_period = {:?}", options.quiet_period);
    println!("  config.poll_timeout = {:?}", options.poll_timeout);
    println!("  config.stop_timeout = {:?}", options.stop_timeout);
    println!("  config.strategy = {:?}", options.strategy);
    if let Some(ref cmd) = cfg.config.on_change {
        println!("  config.on_change = {cmd}");
    }
    println!();

    println!("trees ({}):", cfg.tree.len());
    for tree in cfg.trees() {
        let (include, exclude) = cfg.tree_patterns(tree);
        println!("  - {}", root_dir.join(&tree.root).display());
        if !include.is_empty() {
            println!("      include: {:?}", include);
        }
        if !exclude.is_empty() {
            println!("      exclude: {:?}", exclude);
        }
    }

    if !cfg.files.paths.is_empty() {
        println!("files ({}):", cfg.files.paths.len());
        for path in &cfg.files.paths {
            println!("  - {}", root_dir.join(path).display());
        }
    }

    debug!("dry-run complete (nothing watched)");
}
