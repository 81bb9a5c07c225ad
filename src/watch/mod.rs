// src/watch/mod.rs

//! Watch inputs and their mapping onto native watches.
//!
//! This module is responsible for:
//! - Describing what to watch (`TreeTarget`, `FileTarget`, `WatchInputs`).
//! - Include / exclude predicates for trees (`patterns`).
//! - The handle → context registry and the registrar that fills it.
//!
//! It does **not** poll anything; the event loop in [`crate::engine`] drives
//! the backend and consults the registry.

pub mod inputs;
pub mod path_utils;
pub mod patterns;
pub mod registrar;
pub mod registry;

pub use inputs::{FileTarget, TreeTarget, WatchInputs};
pub use patterns::{FileTreeElement, GlobPredicate, PathPredicate};
pub use registrar::TreeRegistrar;
pub use registry::{FileGroup, WatchContext, WatchEntry, WatchRegistry};
