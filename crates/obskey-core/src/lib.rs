//! Keypad action routing for OBS Studio.
//!
//! A [`Router`] owns the keypad's action slots and an optional
//! [`obskey_rpc::Session`]. Pressing a slot routes its [`Action`] to one of the
//! [`dispatch`] operations, or launches a local program.

pub mod action;
pub mod config;
pub mod dispatch;
pub mod launcher;
pub mod layout;
pub mod query;

mod error;
mod router;

#[cfg(test)]
mod tests;

pub use action::{Action, ActionRecord};
pub use error::{Error, Result, RouterError};
pub use launcher::{Launcher, ShellLauncher};
pub use query::Finding;
pub use router::Router;
