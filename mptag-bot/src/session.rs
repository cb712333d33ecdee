//! Per-chat editing sessions
//!
//! One [`Session`] per chat tracks the temporary copy of the uploaded file
//! and which tag, if any, the next text/photo input will update. All access
//! goes through [`SessionStore`]; no other component touches the fields.
//!
//! # Invariants
//! - A pending field implies an active file.
//! - At most one temp file per chat; replacement deletes the old one.
//! - A temp file never outlives the session's last reference to it.
//!
//! # Concurrency
//! The dispatcher serializes update handling per chat (one lane per chat
//! key, FIFO), so each session sees at most one in-flight mutation. The
//! store's own lock is only held for the duration of a single operation.

use crate::error::{BotError, BotResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Chat key; Telegram chat ids are signed 64-bit
pub type ChatId = i64;

/// Tag awaiting a value from the next inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingField {
    Title,
    Artist,
    Cover,
}

/// Snapshot of one chat's editing state
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Temporary local copy of the uploaded audio file
    pub file_path: Option<PathBuf>,
    /// Tag the next text/photo input will update
    pub pending: Option<PendingField>,
}

/// Keyed store of per-chat sessions
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<ChatId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a chat's session, if one exists; no side effects
    pub async fn get(&self, chat: ChatId) -> Option<Session> {
        self.inner.lock().await.get(&chat).cloned()
    }

    /// Active file path for a chat, if any
    pub async fn file_path(&self, chat: ChatId) -> Option<PathBuf> {
        self.inner.lock().await.get(&chat).and_then(|s| s.file_path.clone())
    }

    /// Pending edit field for a chat, if any
    pub async fn pending(&self, chat: ChatId) -> Option<PendingField> {
        self.inner.lock().await.get(&chat).and_then(|s| s.pending)
    }

    /// Store a freshly downloaded file for a chat
    ///
    /// Deletes the previous temp file if one exists (best effort; a failed
    /// delete is logged and the replacement proceeds) and clears any
    /// pending edit.
    pub async fn set_file(&self, chat: ChatId, path: PathBuf) {
        let mut sessions = self.inner.lock().await;
        let session = sessions.entry(chat).or_default();
        if let Some(old) = session.file_path.take() {
            if old != path {
                if let Err(e) = std::fs::remove_file(&old) {
                    warn!(chat = chat, old = ?old, "Failed to delete replaced temp file: {}", e);
                }
            }
        }
        debug!(chat = chat, path = ?path, "Session file set");
        session.file_path = Some(path);
        session.pending = None;
    }

    /// Mark which tag the next input updates
    ///
    /// Fails with [`BotError::NoActiveFile`] when the chat has no uploaded
    /// file; a pending edit without a file would violate the session
    /// invariant.
    pub async fn set_pending(&self, chat: ChatId, field: PendingField) -> BotResult<()> {
        let mut sessions = self.inner.lock().await;
        let session = sessions.entry(chat).or_default();
        if session.file_path.is_none() {
            return Err(BotError::NoActiveFile);
        }
        session.pending = Some(field);
        Ok(())
    }

    /// Clear the pending edit; idempotent
    pub async fn clear_pending(&self, chat: ChatId) {
        if let Some(session) = self.inner.lock().await.get_mut(&chat) {
            session.pending = None;
        }
    }

    /// Return and clear the chat's file path
    ///
    /// The caller owns deletion of the file after use. Also clears any
    /// pending edit so the invariant holds with no file present.
    pub async fn take_file(&self, chat: ChatId) -> Option<PathBuf> {
        let mut sessions = self.inner.lock().await;
        let session = sessions.get_mut(&chat)?;
        session.pending = None;
        session.file_path.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn make_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"data").unwrap();
        path
    }

    #[tokio::test]
    async fn test_unknown_chat_has_no_session() {
        let store = SessionStore::new();
        assert!(store.get(1).await.is_none());
    }

    #[tokio::test]
    async fn test_set_pending_without_file_fails() {
        let store = SessionStore::new();
        let result = store.set_pending(1, PendingField::Title).await;
        assert!(matches!(result, Err(BotError::NoActiveFile)));
        // Invariant: no pending without a file
        assert!(store.pending(1).await.is_none());
    }

    #[tokio::test]
    async fn test_pending_implies_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new();

        store.set_file(1, make_file(dir.path(), "a.mp3")).await;
        store.set_pending(1, PendingField::Artist).await.unwrap();

        let session = store.get(1).await.unwrap();
        assert!(session.pending.is_some());
        assert!(session.file_path.is_some());
    }

    #[tokio::test]
    async fn test_replacement_deletes_old_file_and_clears_pending() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new();

        let first = make_file(dir.path(), "first.mp3");
        store.set_file(1, first.clone()).await;
        store.set_pending(1, PendingField::Artist).await.unwrap();

        let second = make_file(dir.path(), "second.mp3");
        store.set_file(1, second.clone()).await;

        assert!(!first.exists(), "old temp file must be deleted");
        assert!(second.exists());
        let session = store.get(1).await.unwrap();
        assert_eq!(session.file_path, Some(second));
        assert!(session.pending.is_none());
    }

    #[tokio::test]
    async fn test_sequential_uploads_leave_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new();

        for i in 0..5 {
            store.set_file(1, make_file(dir.path(), &format!("u{}.mp3", i))).await;
        }

        let remaining = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 1, "no orphaned temp files after N uploads");
    }

    #[tokio::test]
    async fn test_delete_failure_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new();

        // Path that never existed; delete fails, replacement proceeds
        store.set_file(1, dir.path().join("ghost.mp3")).await;
        let real = make_file(dir.path(), "real.mp3");
        store.set_file(1, real.clone()).await;

        assert_eq!(store.file_path(1).await, Some(real));
    }

    #[tokio::test]
    async fn test_take_file_clears_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new();

        let path = make_file(dir.path(), "song.mp3");
        store.set_file(1, path.clone()).await;
        store.set_pending(1, PendingField::Cover).await.unwrap();

        assert_eq!(store.take_file(1).await, Some(path));
        let session = store.get(1).await.unwrap();
        assert!(session.file_path.is_none());
        assert!(session.pending.is_none());
        // Second take is empty
        assert!(store.take_file(1).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_pending_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new();

        store.set_file(1, make_file(dir.path(), "a.mp3")).await;
        store.set_pending(1, PendingField::Title).await.unwrap();
        store.clear_pending(1).await;
        store.clear_pending(1).await;
        store.clear_pending(99).await; // unknown chat is a no-op

        assert!(store.pending(1).await.is_none());
        assert!(store.file_path(1).await.is_some());
    }

    #[tokio::test]
    async fn test_chats_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new();

        store.set_file(1, make_file(dir.path(), "one.mp3")).await;
        store.set_file(2, make_file(dir.path(), "two.mp3")).await;
        store.set_pending(2, PendingField::Title).await.unwrap();

        assert!(store.pending(1).await.is_none());
        assert_eq!(store.pending(2).await, Some(PendingField::Title));
    }
}
