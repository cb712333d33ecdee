//! mptag-bot library interface
//!
//! A Telegram bot for editing MP3 ID3 tags: upload a file, edit title,
//! artist and cover through inline-keyboard prompts, download the result.
//! Exposed as a library for integration testing; the binary lives in
//! `main.rs`.

pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod keep_alive;
pub mod session;
pub mod tags;
pub mod telegram;

pub use crate::error::{BotError, BotResult};
