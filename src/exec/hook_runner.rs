// src/exec/hook_runner.rs

//! Runs the configured `on_change` shell command once per notification.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// How a hook invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Success,
    /// Non-zero exit; `-1` when the process was killed by a signal.
    Failed(i32),
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` to completion. Stdout goes to our stdout, stderr is logged.
pub async fn run_hook(cmd: &str, notification: u64) -> Result<HookOutcome> {
    info!(notification, cmd = %cmd, "running on_change hook");

    let mut command = shell_command(cmd);
    command
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning on_change hook '{cmd}'"))?;

    let stderr_task = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(notification, "hook stderr: {}", line);
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for on_change hook '{cmd}'"))?;

    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    let code = status.code().unwrap_or(-1);
    if status.success() {
        info!(notification, exit_code = code, "on_change hook finished");
        Ok(HookOutcome::Success)
    } else {
        warn!(notification, exit_code = code, "on_change hook failed");
        Ok(HookOutcome::Failed(code))
    }
}
