//! Telegram Bot API payload types
//!
//! Minimal serde models of the Bot API objects this service touches.
//! Fields the bot never reads are omitted; Telegram tolerates both
//! directions because every object field is optional on the wire.

use serde::{Deserialize, Serialize};

/// One long-poll update from `getUpdates`
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Chat this update belongs to, if any
    ///
    /// Callback queries carry the chat through the message the inline
    /// keyboard was attached to.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(msg) = &self.message {
            return Some(msg.chat.id);
        }
        self.callback_query
            .as_ref()
            .and_then(|cq| cq.message.as_ref())
            .map(|msg| msg.chat.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub audio: Option<Audio>,
    /// Photo variants, ordered by Telegram from smallest to largest
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

/// One resolution variant of an uploaded photo
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub data: Option<String>,
    pub message: Option<Message>,
}

/// `getFile` result; `file_path` is the download path on the file server
#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub file_path: Option<String>,
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

// ============================================================================
// Outbound markup
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_audio_update() {
        let json = r#"{
            "update_id": 7,
            "message": {
                "message_id": 42,
                "chat": {"id": 1001, "type": "private"},
                "audio": {
                    "file_id": "CQACAgIAAx",
                    "duration": 180,
                    "mime_type": "audio/mpeg",
                    "file_name": "song.mp3"
                }
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 7);
        assert_eq!(update.chat_id(), Some(1001));
        let audio = update.message.unwrap().audio.unwrap();
        assert_eq!(audio.mime_type.as_deref(), Some("audio/mpeg"));
    }

    #[test]
    fn test_deserialize_callback_update() {
        let json = r#"{
            "update_id": 8,
            "callback_query": {
                "id": "4382bfdwdsb323b2d9",
                "data": "change_title",
                "message": {
                    "message_id": 43,
                    "chat": {"id": 1001}
                }
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.chat_id(), Some(1001));
        let cq = update.callback_query.unwrap();
        assert_eq!(cq.data.as_deref(), Some("change_title"));
    }

    #[test]
    fn test_photo_variants_preserve_wire_order() {
        let json = r#"{
            "update_id": 9,
            "message": {
                "message_id": 44,
                "chat": {"id": 1001},
                "photo": [
                    {"file_id": "small", "width": 90, "height": 90},
                    {"file_id": "medium", "width": 320, "height": 320},
                    {"file_id": "large", "width": 800, "height": 800}
                ]
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        let photos = update.message.unwrap().photo;
        assert_eq!(photos.len(), 3);
        assert_eq!(photos.last().unwrap().file_id, "large");
    }

    #[test]
    fn test_update_without_message_has_no_chat() {
        let json = r#"{"update_id": 10}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.chat_id(), None);
    }
}
