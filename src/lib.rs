//! A Discord bot that runs invite races, written in Rust and powered by
//! Twilight.
//!
//! An administrator starts a race with a goal. Every invite created after that
//! moment is tracked, and the first one to be used `goal` times wins.

pub mod bot;
pub mod command;
pub mod config;
pub mod platform;
pub mod race;
pub mod races;
pub mod service;

#[macro_use]
extern crate log;

/// The cargo package version of the bot.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
