//! story-notify library crate.
//!
//! Watches a KakaoStory account for new notifications and hands them to a
//! [`notification::Notifier`]. The binary wires the pieces together; they are
//! exposed here for reuse and testing.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod panic_hook;
pub mod update;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
