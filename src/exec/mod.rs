// src/exec/mod.rs

//! Running the `on_change` hook after a notification.

pub mod hook_runner;

pub use hook_runner::{HookOutcome, run_hook, shell_command};
