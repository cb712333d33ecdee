//! Error types for mptag-bot
//!
//! User-visible failures map to short, non-technical strings via
//! [`BotError::user_message`]; full detail goes to tracing only.

use thiserror::Error;

/// Result type for bot operations
pub type BotResult<T> = Result<T, BotError>;

/// Bot error taxonomy
#[derive(Debug, Error)]
pub enum BotError {
    /// An edit or download was requested with no uploaded file in session
    #[error("no active file for this chat")]
    NoActiveFile,

    /// Uploaded file is not MPEG audio
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The tag store cannot parse the audio container
    #[error("cannot parse audio container: {0}")]
    CorruptFile(String),

    /// Platform-level expired interaction token; logged and dropped,
    /// never surfaced to the user
    #[error("stale interaction: {0}")]
    TransportStale(String),

    /// Telegram API returned a non-ok response
    #[error("Telegram API error: {0}")]
    Api(String),

    /// Temp file read/write/delete failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// mptag-common error
    #[error("Common error: {0}")]
    Common(#[from] mptag_common::Error),
}

impl BotError {
    /// Short message suitable for showing to the end user
    pub fn user_message(&self) -> &'static str {
        match self {
            BotError::NoActiveFile => "Send me an MP3 file first.",
            BotError::UnsupportedMediaType(_) => "Please send a file in MP3 format.",
            BotError::CorruptFile(_) => "Could not process this file. Try another one.",
            // Stale interactions are dropped before reaching the user
            BotError::TransportStale(_) => "",
            BotError::Api(_) | BotError::Io(_) | BotError::Http(_) | BotError::Common(_) => {
                "Something went wrong. Please try again."
            }
        }
    }
}
