// src/exec/mod.rs

//! What it means to start a unit.
//!
//! - [`action`] provides the [`StartAction`] trait the runner calls, plus
//!   [`action_fn`] for closure-based actions.
//! - [`shell`] provides [`ShellAction`], which runs each unit's configured
//!   command and is what the `startorder` binary uses.

pub mod action;
pub mod shell;

pub use action::{action_fn, FnAction, StartAction, StartFuture};
pub use shell::ShellAction;
