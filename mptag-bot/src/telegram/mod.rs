//! Telegram transport layer
//!
//! The controller talks to the platform through the [`Transport`] trait;
//! [`BotClient`] is the reqwest-backed implementation. Tests substitute a
//! recording mock.

pub mod client;
pub mod types;

pub use client::BotClient;
pub use types::{
    Audio, CallbackQuery, Chat, FileInfo, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    PhotoSize, Update,
};

use crate::error::BotResult;
use async_trait::async_trait;
use std::path::Path;

/// Outbound side of the chat platform
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message, optionally with an inline keyboard
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> BotResult<()>;

    /// Edit an existing bot message in place
    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> BotResult<()>;

    /// Acknowledge a callback query (stops the client-side spinner)
    async fn answer_callback(&self, callback_query_id: &str) -> BotResult<()>;

    /// Download a platform-hosted file to a local path
    async fn download_file(&self, file_id: &str, dest: &Path) -> BotResult<()>;

    /// Send a local audio file back to the chat
    async fn send_audio(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        title: &str,
        performer: &str,
    ) -> BotResult<()>;
}
