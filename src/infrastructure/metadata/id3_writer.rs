//! ID3v2.4 tag writer

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use id3::frame::{Picture, PictureType};
use id3::{ErrorKind, Tag, TagLike, Version};

use crate::application::ports::{MetadataError, MetadataWriter};
use crate::domain::metadata::AudiobookMetadata;

/// Writes audiobook fields as ID3v2.4 frames, replacing earlier values
#[derive(Debug, Clone, Default)]
pub struct Id3MetadataWriter;

impl Id3MetadataWriter {
    pub fn new() -> Self {
        Self
    }
}

/// Set or clear one text frame
fn set_or_remove(tag: &mut Tag, id: &str, value: Option<String>) {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => tag.set_text(id, v),
        None => {
            tag.remove(id);
        }
    }
}

/// Apply `metadata` to `tag`
pub fn apply_metadata(tag: &mut Tag, metadata: &AudiobookMetadata) {
    set_or_remove(tag, "TIT2", Some(metadata.title.clone()));
    set_or_remove(tag, "TPE1", Some(metadata.artist.clone()));
    set_or_remove(tag, "TALB", Some(metadata.album.clone()));
    set_or_remove(tag, "TRCK", metadata.track_label());
    set_or_remove(tag, "TCON", Some(metadata.genre.clone()));
    set_or_remove(tag, "TDRC", metadata.year.map(|y| y.to_string()));
    // Narrator goes in the album-artist frame
    set_or_remove(tag, "TPE2", Some(metadata.narrator.clone()));
    set_or_remove(tag, "TIT1", metadata.series_label());
    set_or_remove(tag, "TPOS", metadata.disc_label());

    if let Some(cover) = &metadata.cover_art {
        tag.remove_all_pictures();
        tag.add_frame(Picture {
            mime_type: cover.mime_type.clone(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data: cover.data.clone(),
        });
    }
}

fn write_blocking(path: PathBuf, metadata: AudiobookMetadata) -> Result<(), MetadataError> {
    if !path.exists() {
        return Err(MetadataError::FileMissing(path));
    }

    let mut tag = match Tag::read_from_path(&path) {
        Ok(tag) => tag,
        Err(e) if matches!(e.kind, ErrorKind::NoTag) => Tag::new(),
        Err(e) => return Err(MetadataError::ReadFailed(e.to_string())),
    };

    apply_metadata(&mut tag, &metadata);

    tag.write_to_path(&path, Version::Id3v24)
        .map_err(|e| MetadataError::WriteFailed(e.to_string()))
}

#[async_trait]
impl MetadataWriter for Id3MetadataWriter {
    async fn write(&self, file: &Path, metadata: &AudiobookMetadata) -> Result<(), MetadataError> {
        let path = file.to_path_buf();
        let metadata = metadata.clone();
        tracing::debug!(file = %path.display(), "Writing ID3 tags");

        tokio::task::spawn_blocking(move || write_blocking(path, metadata))
            .await
            .map_err(|e| MetadataError::WriteFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metadata::CoverArt;

    fn sample() -> AudiobookMetadata {
        AudiobookMetadata {
            title: "Chapter One".to_string(),
            artist: "Jane Author".to_string(),
            album: "The Long Book".to_string(),
            track_number: 1,
            total_tracks: 12,
            year: Some(2021),
            narrator: "Sam Reader".to_string(),
            series: "Saga".to_string(),
            series_number: "2".to_string(),
            disc_number: Some(1),
            total_discs: Some(9),
            ..AudiobookMetadata::default()
        }
    }

    fn text(tag: &Tag, id: &str) -> Option<String> {
        tag.get(id)
            .and_then(|f| f.content().text())
            .map(str::to_string)
    }

    #[test]
    fn maps_fields_to_frames() {
        let mut tag = Tag::new();
        apply_metadata(&mut tag, &sample());

        assert_eq!(tag.title(), Some("Chapter One"));
        assert_eq!(tag.artist(), Some("Jane Author"));
        assert_eq!(tag.album(), Some("The Long Book"));
        assert_eq!(text(&tag, "TRCK").as_deref(), Some("1/12"));
        assert_eq!(text(&tag, "TCON").as_deref(), Some("Audiobook"));
        assert_eq!(text(&tag, "TDRC").as_deref(), Some("2021"));
        assert_eq!(text(&tag, "TPE2").as_deref(), Some("Sam Reader"));
        assert_eq!(text(&tag, "TIT1").as_deref(), Some("Saga #2"));
        assert_eq!(text(&tag, "TPOS").as_deref(), Some("1/9"));
    }

    #[test]
    fn empty_fields_clear_old_frames() {
        let mut tag = Tag::new();
        tag.set_text("TPE2", "Old Narrator");
        apply_metadata(&mut tag, &AudiobookMetadata::for_track(4));

        assert_eq!(text(&tag, "TPE2"), None);
        assert_eq!(text(&tag, "TRCK").as_deref(), Some("4"));
    }

    #[test]
    fn cover_replaces_existing_pictures() {
        let mut tag = Tag::new();
        let mut meta = sample();
        meta.cover_art = Some(CoverArt::new(vec![1, 2, 3], "image/png"));
        apply_metadata(&mut tag, &meta);
        apply_metadata(&mut tag, &meta);

        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].mime_type, "image/png");
        assert_eq!(pictures[0].picture_type, PictureType::CoverFront);
    }

    #[tokio::test]
    async fn writes_tags_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("01 - Chapter One.mp3");
        std::fs::write(&file, vec![0u8; 256]).unwrap();

        Id3MetadataWriter::new().write(&file, &sample()).await.unwrap();

        let tag = Tag::read_from_path(&file).unwrap();
        assert_eq!(tag.title(), Some("Chapter One"));
        assert_eq!(text(&tag, "TPE2").as_deref(), Some("Sam Reader"));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let result = Id3MetadataWriter::new()
            .write(Path::new("/nonexistent/book.mp3"), &sample())
            .await;
        assert!(matches!(result, Err(MetadataError::FileMissing(_))));
    }
}
