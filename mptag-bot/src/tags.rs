//! ID3 tag store adapter
//!
//! Wraps the `id3` crate behind the [`TagStore`] trait. Missing tags read
//! as `None`/false, never as an error; a file whose tag data cannot be
//! parsed surfaces as [`BotError::CorruptFile`]. Writes create the tag
//! container when the file has none.

use crate::error::{BotError, BotResult};
use async_trait::async_trait;
use id3::frame::{Picture, PictureType};
use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;
use tracing::debug;

/// Tag values readable from an audio file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub has_cover: bool,
}

/// Read/write access to embedded audio metadata
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Read title, artist and cover presence; absent tags are `None`/false
    async fn read(&self, path: &Path) -> BotResult<TrackTags>;

    /// Overwrite the title, creating the tag container if needed
    async fn write_title(&self, path: &Path, text: &str) -> BotResult<()>;

    /// Overwrite the artist, creating the tag container if needed
    async fn write_artist(&self, path: &Path, text: &str) -> BotResult<()>;

    /// Replace the embedded cover art (at most one cover per file)
    async fn write_cover(&self, path: &Path, image: Vec<u8>) -> BotResult<()>;
}

/// `id3`-backed tag store for MP3 files
#[derive(Debug, Default)]
pub struct Id3TagStore;

impl Id3TagStore {
    pub fn new() -> Self {
        Self
    }

    /// Load the tag, treating an absent container as an empty tag
    fn read_or_empty(path: &Path) -> BotResult<Tag> {
        match Tag::read_from_path(path) {
            Ok(tag) => Ok(tag),
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Ok(Tag::new()),
            Err(e) => Err(map_id3_error(e)),
        }
    }

    fn save(tag: &Tag, path: &Path) -> BotResult<()> {
        tag.write_to_path(path, Version::Id3v24)
            .map_err(map_id3_error)
    }
}

fn map_id3_error(e: id3::Error) -> BotError {
    let message = e.to_string();
    match e.kind {
        ErrorKind::Io(io_err) => BotError::Io(io_err),
        _ => BotError::CorruptFile(message),
    }
}

#[async_trait]
impl TagStore for Id3TagStore {
    async fn read(&self, path: &Path) -> BotResult<TrackTags> {
        let tag = Self::read_or_empty(path)?;
        let tags = TrackTags {
            title: tag.title().map(str::to_string),
            artist: tag.artist().map(str::to_string),
            has_cover: tag.pictures().next().is_some(),
        };
        debug!(path = ?path, has_title = tags.title.is_some(),
               has_artist = tags.artist.is_some(), has_cover = tags.has_cover,
               "Tags read");
        Ok(tags)
    }

    async fn write_title(&self, path: &Path, text: &str) -> BotResult<()> {
        let mut tag = Self::read_or_empty(path)?;
        tag.set_title(text);
        Self::save(&tag, path)?;
        debug!(path = ?path, "Title written");
        Ok(())
    }

    async fn write_artist(&self, path: &Path, text: &str) -> BotResult<()> {
        let mut tag = Self::read_or_empty(path)?;
        tag.set_artist(text);
        Self::save(&tag, path)?;
        debug!(path = ?path, "Artist written");
        Ok(())
    }

    async fn write_cover(&self, path: &Path, image: Vec<u8>) -> BotResult<()> {
        let mut tag = Self::read_or_empty(path)?;
        // Repeated cover writes replace rather than accumulate
        tag.remove("APIC");
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data: image,
        });
        Self::save(&tag, path)?;
        debug!(path = ?path, "Cover written");
        Ok(())
    }
}
