//! Session controller
//!
//! Applies inbound updates to per-chat sessions: uploads replace the
//! session file, button presses arm a pending edit, and the next matching
//! text/photo input writes the tag through the [`TagStore`]. Every outbound
//! reply goes through the [`Transport`] seam.
//!
//! States per chat: Idle (no file), Ready (file, no pending edit), and one
//! Awaiting state per editable tag. A failed tag write clears the pending
//! edit before the failure is reported, so the user is never stuck
//! mid-edit; retry means pressing the button again.

use crate::error::{BotError, BotResult};
use crate::session::{ChatId, PendingField, SessionStore};
use crate::tags::{TagStore, TrackTags};
use crate::telegram::{
    Audio, CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, PhotoSize, Transport, Update,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const MSG_WELCOME: &str = "Welcome to the MP3 tag editor!\n\n\
    Send me an MP3 file, then use the buttons below to edit its tags.";
const MSG_FILE_RECEIVED: &str = "File received! Choose an action:";
const MSG_WHAT_NEXT: &str = "What next?";
const MSG_MAIN_MENU: &str = "Main menu:";
const MSG_PROMPT_TITLE: &str = "Enter the new title:";
const MSG_PROMPT_ARTIST: &str = "Enter the artist name:";
const MSG_PROMPT_COVER: &str = "Send the cover image:";
const MSG_TITLE_UPDATED: &str = "Title updated.";
const MSG_ARTIST_UPDATED: &str = "Artist updated.";
const MSG_COVER_UPDATED: &str = "Cover updated.";
const MSG_FILE_SENT: &str = "File sent! What next?";
const NOT_SET: &str = "Not set";

/// Inline keyboard actions, matched exhaustively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ChangeTitle,
    ChangeArtist,
    ChangeCover,
    ShowTags,
    DownloadFile,
    BackToMenu,
}

impl Action {
    /// Parse callback data; unknown data yields `None` and is dropped
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "change_title" => Some(Action::ChangeTitle),
            "change_artist" => Some(Action::ChangeArtist),
            "change_cover" => Some(Action::ChangeCover),
            "show_tags" => Some(Action::ShowTags),
            "download_file" => Some(Action::DownloadFile),
            "back_to_menu" => Some(Action::BackToMenu),
            _ => None,
        }
    }

    /// Wire identifier carried in the inline keyboard
    pub fn callback_data(&self) -> &'static str {
        match self {
            Action::ChangeTitle => "change_title",
            Action::ChangeArtist => "change_artist",
            Action::ChangeCover => "change_cover",
            Action::ShowTags => "show_tags",
            Action::DownloadFile => "download_file",
            Action::BackToMenu => "back_to_menu",
        }
    }
}

/// Main menu shown after uploads and completed edits
pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::new("Change title", Action::ChangeTitle.callback_data())],
            vec![InlineKeyboardButton::new("Change artist", Action::ChangeArtist.callback_data())],
            vec![InlineKeyboardButton::new("Change cover", Action::ChangeCover.callback_data())],
            vec![InlineKeyboardButton::new("Show tags", Action::ShowTags.callback_data())],
            vec![InlineKeyboardButton::new("Download file", Action::DownloadFile.callback_data())],
        ],
    }
}

fn back_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::new(
            "Back",
            Action::BackToMenu.callback_data(),
        )]],
    }
}

/// Applies updates to sessions, invoking the tag store and the transport
pub struct Controller {
    transport: Arc<dyn Transport>,
    tags: Arc<dyn TagStore>,
    sessions: SessionStore,
    /// Directory holding temp audio and cover files
    work_dir: PathBuf,
}

impl Controller {
    pub fn new(
        transport: Arc<dyn Transport>,
        tags: Arc<dyn TagStore>,
        sessions: SessionStore,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            transport,
            tags,
            sessions,
            work_dir,
        }
    }

    /// Handle one update end to end
    ///
    /// Never returns an error: stale interactions are logged and dropped,
    /// everything else is logged and reported to the user as a short
    /// non-technical message.
    pub async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        let Some(chat) = update.chat_id() else {
            debug!(update_id = update_id, "Update without chat; dropped");
            return;
        };

        match self.dispatch(chat, update).await {
            Ok(()) => {}
            Err(BotError::TransportStale(desc)) => {
                debug!(chat = chat, "Dropped stale interaction: {}", desc);
            }
            Err(e) => {
                error!(chat = chat, update_id = update_id, "Update handling failed: {}", e);
                if let Err(send_err) = self.transport.send_text(chat, e.user_message(), None).await
                {
                    error!(chat = chat, "Failed to report error to user: {}", send_err);
                }
            }
        }
    }

    async fn dispatch(&self, chat: ChatId, update: Update) -> BotResult<()> {
        if let Some(cq) = update.callback_query {
            return self.handle_callback(chat, cq).await;
        }
        let Some(message) = update.message else {
            return Ok(());
        };

        if let Some(audio) = message.audio {
            return self.handle_audio(chat, audio).await;
        }
        if !message.photo.is_empty() {
            return self.handle_photo(chat, &message.photo, update.update_id).await;
        }
        if let Some(text) = message.text {
            if let Some(command) = text.strip_prefix('/') {
                return self.handle_command(chat, command).await;
            }
            return self.handle_text(chat, &text).await;
        }
        Ok(())
    }

    async fn handle_command(&self, chat: ChatId, command: &str) -> BotResult<()> {
        match command.split_whitespace().next() {
            Some("start") => {
                info!(chat = chat, "New conversation started");
                self.transport
                    .send_text(chat, MSG_WELCOME, Some(main_menu()))
                    .await
            }
            other => {
                debug!(chat = chat, command = ?other, "Unknown command ignored");
                Ok(())
            }
        }
    }

    /// Inbound audio: download to a temp path and make it the session file
    async fn handle_audio(&self, chat: ChatId, audio: Audio) -> BotResult<()> {
        let mime = audio.mime_type.as_deref().unwrap_or("unknown");
        if mime != "audio/mpeg" {
            return Err(BotError::UnsupportedMediaType(mime.to_string()));
        }

        let dest = self.work_dir.join(format!("temp_{}.mp3", audio.file_id));
        self.transport.download_file(&audio.file_id, &dest).await?;

        // Probe the container before adopting the file; a corrupt upload is
        // rejected and its temp copy removed.
        if let Err(e) = self.tags.read(&dest).await {
            remove_temp(&dest);
            return Err(e);
        }

        self.sessions.set_file(chat, dest).await;
        info!(chat = chat, file_name = ?audio.file_name, "Audio file accepted");
        self.transport
            .send_text(chat, MSG_FILE_RECEIVED, Some(main_menu()))
            .await
    }

    /// Inbound text: applies to a pending title/artist edit, otherwise ignored
    async fn handle_text(&self, chat: ChatId, text: &str) -> BotResult<()> {
        let field = match self.sessions.pending(chat).await {
            Some(field @ (PendingField::Title | PendingField::Artist)) => field,
            // A cover prompt only accepts photos; text leaves it armed
            Some(PendingField::Cover) => return Ok(()),
            None => {
                debug!(chat = chat, "Text with no pending edit; ignored");
                return Ok(());
            }
        };

        let Some(path) = self.sessions.file_path(chat).await else {
            self.sessions.clear_pending(chat).await;
            return Err(BotError::NoActiveFile);
        };

        // Fail-closed: the pending marker clears whether or not the write
        // succeeds, so a failed write never leaves the chat stuck mid-edit.
        self.sessions.clear_pending(chat).await;
        let confirmation = match field {
            PendingField::Title => {
                self.tags.write_title(&path, text).await?;
                MSG_TITLE_UPDATED
            }
            PendingField::Artist => {
                self.tags.write_artist(&path, text).await?;
                MSG_ARTIST_UPDATED
            }
            // Excluded above; kept for match completeness
            PendingField::Cover => return Ok(()),
        };

        info!(chat = chat, field = ?field, "Tag updated");
        self.transport.send_text(chat, confirmation, None).await?;
        self.transport
            .send_text(chat, MSG_WHAT_NEXT, Some(main_menu()))
            .await
    }

    /// Inbound photo: consumed by a pending cover edit, otherwise ignored
    async fn handle_photo(
        &self,
        chat: ChatId,
        photos: &[PhotoSize],
        update_id: i64,
    ) -> BotResult<()> {
        if self.sessions.pending(chat).await != Some(PendingField::Cover) {
            debug!(chat = chat, "Photo with no pending cover edit; ignored");
            return Ok(());
        }
        let Some(audio_path) = self.sessions.file_path(chat).await else {
            self.sessions.clear_pending(chat).await;
            return Err(BotError::NoActiveFile);
        };
        let Some(largest) = photos.iter().max_by_key(|p| u64::from(p.width) * u64::from(p.height))
        else {
            return Ok(());
        };

        self.sessions.clear_pending(chat).await;

        let cover_path = self.work_dir.join(format!("temp_cover_{}.jpg", update_id));
        let result = self
            .fetch_and_apply_cover(&largest.file_id, &cover_path, &audio_path)
            .await;
        // The transient cover file is deleted on every exit path
        remove_temp(&cover_path);
        result?;

        info!(chat = chat, "Cover updated");
        self.transport.send_text(chat, MSG_COVER_UPDATED, None).await?;
        self.transport
            .send_text(chat, MSG_WHAT_NEXT, Some(main_menu()))
            .await
    }

    async fn fetch_and_apply_cover(
        &self,
        file_id: &str,
        cover_path: &Path,
        audio_path: &Path,
    ) -> BotResult<()> {
        self.transport.download_file(file_id, cover_path).await?;
        let image = tokio::fs::read(cover_path).await?;
        self.tags.write_cover(audio_path, image).await
    }

    /// Button press routed through the closed [`Action`] set
    async fn handle_callback(&self, chat: ChatId, cq: CallbackQuery) -> BotResult<()> {
        let Some(message) = &cq.message else {
            debug!(chat = chat, "Callback without source message; dropped");
            return Ok(());
        };
        let message_id = message.message_id;

        // A stale query surfaces here as TransportStale and is dropped
        self.transport.answer_callback(&cq.id).await?;

        let Some(action) = cq.data.as_deref().and_then(Action::parse) else {
            debug!(chat = chat, data = ?cq.data, "Unknown callback data; dropped");
            return Ok(());
        };

        let Some(path) = self.sessions.file_path(chat).await else {
            return self
                .transport
                .edit_text(chat, message_id, BotError::NoActiveFile.user_message(), None)
                .await;
        };

        match action {
            Action::ChangeTitle => {
                self.sessions.set_pending(chat, PendingField::Title).await?;
                self.transport.edit_text(chat, message_id, MSG_PROMPT_TITLE, None).await
            }
            Action::ChangeArtist => {
                self.sessions.set_pending(chat, PendingField::Artist).await?;
                self.transport.edit_text(chat, message_id, MSG_PROMPT_ARTIST, None).await
            }
            Action::ChangeCover => {
                self.sessions.set_pending(chat, PendingField::Cover).await?;
                self.transport.edit_text(chat, message_id, MSG_PROMPT_COVER, None).await
            }
            Action::ShowTags => {
                let tags = self.tags.read(&path).await?;
                self.transport
                    .edit_text(chat, message_id, &tags_summary(&tags), Some(back_menu()))
                    .await
            }
            Action::DownloadFile => self.send_file_back(chat, &path).await,
            Action::BackToMenu => {
                self.transport
                    .edit_text(chat, message_id, MSG_MAIN_MENU, Some(main_menu()))
                    .await
            }
        }
    }

    /// Send the edited file back, then tear the session down
    async fn send_file_back(&self, chat: ChatId, path: &Path) -> BotResult<()> {
        let tags = self.tags.read(path).await?;
        let title = tags.title.as_deref().unwrap_or(NOT_SET);
        let performer = tags.artist.as_deref().unwrap_or(NOT_SET);
        let caption = format!(
            "Your edited file is ready!\n\n{}",
            tags_block(&tags)
        );

        self.transport
            .send_audio(chat, path, &caption, title, performer)
            .await?;

        // Only after a successful send does the session give up the file
        if let Some(sent) = self.sessions.take_file(chat).await {
            remove_temp(&sent);
        }
        info!(chat = chat, "Edited file sent; session reset");
        self.transport
            .send_text(chat, MSG_FILE_SENT, Some(main_menu()))
            .await
    }
}

fn tags_block(tags: &TrackTags) -> String {
    format!(
        "Title: {}\nArtist: {}\nCover: {}",
        tags.title.as_deref().unwrap_or(NOT_SET),
        tags.artist.as_deref().unwrap_or(NOT_SET),
        if tags.has_cover { "yes" } else { "no" },
    )
}

fn tags_summary(tags: &TrackTags) -> String {
    format!("Current tags:\n\n{}", tags_block(tags))
}

/// Best-effort temp file removal; a failed delete is logged, never fatal
fn remove_temp(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = ?path, "Failed to delete temp file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_round_trip() {
        for action in [
            Action::ChangeTitle,
            Action::ChangeArtist,
            Action::ChangeCover,
            Action::ShowTags,
            Action::DownloadFile,
            Action::BackToMenu,
        ] {
            assert_eq!(Action::parse(action.callback_data()), Some(action));
        }
    }

    #[test]
    fn test_unknown_callback_data_is_rejected() {
        assert_eq!(Action::parse("drop_tables"), None);
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("CHANGE_TITLE"), None);
    }

    #[test]
    fn test_main_menu_layout() {
        let menu = main_menu();
        assert_eq!(menu.inline_keyboard.len(), 5, "one row per action");
        let data: Vec<&str> = menu
            .inline_keyboard
            .iter()
            .flat_map(|row| row.iter().map(|b| b.callback_data.as_str()))
            .collect();
        assert_eq!(
            data,
            vec!["change_title", "change_artist", "change_cover", "show_tags", "download_file"]
        );
    }

    #[test]
    fn test_tags_summary_placeholders() {
        let summary = tags_summary(&TrackTags::default());
        assert!(summary.contains("Title: Not set"));
        assert!(summary.contains("Artist: Not set"));
        assert!(summary.contains("Cover: no"));

        let summary = tags_summary(&TrackTags {
            title: Some("My Song".to_string()),
            artist: Some("Band".to_string()),
            has_cover: true,
        });
        assert!(summary.contains("Title: My Song"));
        assert!(summary.contains("Cover: yes"));
    }
}
