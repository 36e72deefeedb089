//! Media handed to adapters
//!
//! A local file is read at most once per publish request into a
//! [`MediaBlob`]. Clones share the same buffer.

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::ValidationError;

/// MIME types the adapters know how to upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
    Mp4,
    QuickTime,
    Webm,
    OctetStream,
}

impl MediaMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "webp" => Self::WebP,
            "mp4" | "m4v" => Self::Mp4,
            "mov" => Self::QuickTime,
            "webm" => Self::Webm,
            _ => Self::OctetStream,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::OctetStream)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Mp4 => "video/mp4",
            Self::QuickTime => "video/quicktime",
            Self::Webm => "video/webm",
            Self::OctetStream => "application/octet-stream",
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Mp4 | Self::QuickTime | Self::Webm)
    }
}

impl std::fmt::Display for MediaMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable contents of a local media file
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub file_name: String,
    pub mime_type: MediaMimeType,
    /// SHA-256 of the content (hex encoded)
    pub sha256: String,
    pub bytes: Bytes,
}

impl MediaBlob {
    pub fn from_bytes(file_name: impl Into<String>, mime_type: MediaMimeType, bytes: Bytes) -> Self {
        let sha256 = format!("{:x}", Sha256::digest(&bytes));
        Self {
            file_name: file_name.into(),
            mime_type,
            sha256,
            bytes,
        }
    }

    /// Read a file from disk. Failures are reported as
    /// [`ValidationError::MediaUnavailable`].
    pub async fn load(path: &Path) -> Result<Self, ValidationError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            ValidationError::MediaUnavailable(format!("{}: {}", path.display(), e))
        })?;

        if data.is_empty() {
            return Err(ValidationError::MediaUnavailable(format!(
                "{}: file is empty",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("media")
            .to_string();

        Ok(Self::from_bytes(
            file_name,
            MediaMimeType::from_path(path),
            Bytes::from(data),
        ))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The media a single target receives
#[derive(Debug, Clone, Default)]
pub enum MediaPayload {
    /// Uploaded bytes (YouTube, Twitter with a file)
    Bytes(MediaBlob),
    /// A URL the platform fetches itself
    Url(String),
    #[default]
    None,
}

impl MediaPayload {
    pub fn blob(&self) -> Option<&MediaBlob> {
        match self {
            MediaPayload::Bytes(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            MediaPayload::Url(url) => Some(url),
            _ => None,
        }
    }
}

/// Whether a URL most likely points at a video, judged by its extension
pub fn url_is_video(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit_once('.')
        .map(|(_, ext)| MediaMimeType::from_extension(ext).is_video())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(MediaMimeType::from_extension("JPG"), MediaMimeType::Jpeg);
        assert_eq!(MediaMimeType::from_extension("mov"), MediaMimeType::QuickTime);
        assert_eq!(MediaMimeType::from_extension("exe"), MediaMimeType::OctetStream);
        assert!(MediaMimeType::Mp4.is_video());
        assert!(!MediaMimeType::Png.is_video());
    }

    #[test]
    fn test_url_is_video() {
        assert!(url_is_video("https://cdn.example.com/clip.MP4"));
        assert!(url_is_video("https://cdn.example.com/clip.mov?sig=abc.jpg"));
        assert!(!url_is_video("https://cdn.example.com/photo.jpg"));
        assert!(!url_is_video("https://cdn.example.com/photo"));
    }

    #[tokio::test]
    async fn test_load_blob() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.mp4");
        std::fs::write(&path, b"abc").unwrap();

        let blob = MediaBlob::load(&path).await.unwrap();
        assert_eq!(blob.file_name, "clip.mp4");
        assert_eq!(blob.mime_type, MediaMimeType::Mp4);
        assert_eq!(blob.len(), 3);
        assert_eq!(
            blob.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = MediaBlob::load(Path::new("/nonexistent/clip.mp4")).await;
        assert!(matches!(result, Err(ValidationError::MediaUnavailable(_))));
    }

    #[tokio::test]
    async fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();

        let result = MediaBlob::load(&path).await;
        assert!(matches!(result, Err(ValidationError::MediaUnavailable(_))));
    }

    #[test]
    fn test_blob_clone_shares_buffer() {
        let blob = MediaBlob::from_bytes("a.png", MediaMimeType::Png, Bytes::from_static(b"png"));
        let copy = blob.clone();
        assert_eq!(blob.bytes.as_ptr(), copy.bytes.as_ptr());
    }
}
