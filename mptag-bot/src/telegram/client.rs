//! Telegram Bot API client
//!
//! Thin reqwest wrapper over the HTTPS JSON Bot API. Inbound updates come
//! from `getUpdates` long polling; outbound traffic goes through the
//! [`Transport`] trait implementation.
//!
//! # API Reference
//! - Endpoint: https://api.telegram.org/bot{token}/{method}
//! - File server: https://api.telegram.org/file/bot{token}/{file_path}

use crate::error::{BotError, BotResult};
use crate::telegram::types::{ApiResponse, FileInfo, InlineKeyboardMarkup, Update};
use crate::telegram::Transport;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default timeout for single-shot API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra headroom on top of the long-poll timeout
const POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Telegram Bot API client
pub struct BotClient {
    /// HTTP client for API requests
    http_client: Client,
    /// `https://api.telegram.org/bot{token}`
    api_base: String,
    /// `https://api.telegram.org/file/bot{token}`
    file_base: String,
}

impl BotClient {
    /// Create a new client for the given bot token
    pub fn new(token: &str) -> BotResult<Self> {
        // No global client timeout: long polls outlive any sane default.
        // Each request sets its own deadline instead.
        let http_client = Client::builder().build()?;
        Ok(Self {
            http_client,
            api_base: format!("https://api.telegram.org/bot{}", token),
            file_base: format!("https://api.telegram.org/file/bot{}", token),
        })
    }

    /// Long-poll for updates after `offset`
    ///
    /// Blocks server-side for up to `timeout_secs`; an empty vec simply
    /// means the poll window elapsed without traffic.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> BotResult<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call_with_timeout(
            "getUpdates",
            &body,
            Duration::from_secs(timeout_secs) + POLL_TIMEOUT_MARGIN,
        )
        .await
    }

    /// Invoke a Bot API method and unwrap the response envelope
    async fn call<R: DeserializeOwned>(&self, method: &str, body: &serde_json::Value) -> BotResult<R> {
        self.call_with_timeout(method, body, DEFAULT_TIMEOUT).await
    }

    async fn call_with_timeout<R: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> BotResult<R> {
        debug!(method = method, "Calling Telegram API");
        let response = self
            .http_client
            .post(format!("{}/{}", self.api_base, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        // Telegram answers errors with a JSON envelope and a matching HTTP
        // status; the envelope carries the usable description either way.
        let status = response.status();
        let api: ApiResponse<R> = response
            .json()
            .await
            .map_err(|e| BotError::Api(format!("{} returned unparsable body: {}", method, e)))?;

        if api.ok {
            return api
                .result
                .ok_or_else(|| BotError::Api(format!("{} returned ok without result", method)));
        }

        let description = api.description.unwrap_or_else(|| "unknown error".to_string());
        if is_stale_description(&description) {
            return Err(BotError::TransportStale(description));
        }
        Err(BotError::Api(format!(
            "{} failed ({}): {}",
            method, status, description
        )))
    }
}

/// Expired or invalid callback queries per Bot API error text
fn is_stale_description(description: &str) -> bool {
    description.contains("query is too old") || description.contains("query ID is invalid")
}

#[async_trait]
impl Transport for BotClient {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> BotResult<()> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|e| BotError::Api(format!("keyboard serialization failed: {}", e)))?;
        }
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> BotResult<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|e| BotError::Api(format!("keyboard serialization failed: {}", e)))?;
        }
        let _: serde_json::Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_query_id: &str) -> BotResult<()> {
        let body = json!({ "callback_query_id": callback_query_id });
        let _: serde_json::Value = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> BotResult<()> {
        let info: FileInfo = self
            .call("getFile", &json!({ "file_id": file_id }))
            .await?;
        let file_path = info
            .file_path
            .ok_or_else(|| BotError::Api(format!("getFile({}) returned no path", info.file_id)))?;

        let response = self
            .http_client
            .get(format!("{}/{}", self.file_base, file_path))
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        tokio::fs::write(dest, &bytes).await?;
        debug!(file_id = file_id, dest = ?dest, size = bytes.len(), "File downloaded");
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        title: &str,
        performer: &str,
    ) -> BotResult<()> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .text("title", title.to_string())
            .text("performer", performer.to_string())
            .part("audio", part);

        let response = self
            .http_client
            .post(format!("{}/sendAudio", self.api_base))
            .timeout(Duration::from_secs(120)) // large uploads
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let api: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BotError::Api(format!("sendAudio returned unparsable body: {}", e)))?;
        if !api.ok {
            return Err(BotError::Api(format!(
                "sendAudio failed ({}): {}",
                status,
                api.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_description_detection() {
        assert!(is_stale_description(
            "Bad Request: query is too old and response timeout expired or query ID is invalid"
        ));
        assert!(!is_stale_description("Bad Request: message is not modified"));
    }

    #[test]
    fn test_error_envelope_parses() {
        let json = r#"{"ok": false, "error_code": 400, "description": "Bad Request"}"#;
        let api: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(!api.ok);
        assert!(api.result.is_none());
        assert_eq!(api.description.as_deref(), Some("Bad Request"));
    }

    #[test]
    fn test_updates_envelope_parses() {
        let json = r#"{"ok": true, "result": [{"update_id": 1}, {"update_id": 2}]}"#;
        let api: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(api.ok);
        assert_eq!(api.result.unwrap().len(), 2);
    }

    #[test]
    fn test_api_base_urls() {
        let client = BotClient::new("123:abc").unwrap();
        assert_eq!(client.api_base, "https://api.telegram.org/bot123:abc");
        assert_eq!(client.file_base, "https://api.telegram.org/file/bot123:abc");
    }
}
