//! Upload validation and input sanitization.
//!
//! Every check here runs before anything is written to storage.

use super::video_service::VideoError;
use crate::constants::{DEFAULT_TAGS, limits};
use std::io::SeekFrom;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// A seekable async byte source.
pub trait UploadStream: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T> UploadStream for T where T: AsyncRead + AsyncSeek + Unpin + Send {}

/// The uploaded file together with its multipart header fields.
pub struct UploadSource {
    pub reader: Box<dyn UploadStream>,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

impl UploadSource {
    pub fn new(
        reader: impl UploadStream + 'static,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            filename: filename.into(),
            content_type: content_type.into(),
            size,
        }
    }
}

impl std::fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSource")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

pub fn validate_size(size: u64, max_size: u64) -> Result<(), VideoError> {
    if size == 0 {
        return Err(VideoError::Validation("uploaded file is empty".to_string()));
    }
    if size > max_size {
        return Err(VideoError::Validation(format!(
            "file too large: {size} bytes exceeds the {max_size} byte limit"
        )));
    }
    Ok(())
}

/// Compares the media type with parameters stripped, ignoring case.
pub fn validate_content_type(content_type: &str, allowed: &[String]) -> Result<(), VideoError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&essence)) {
        Ok(())
    } else {
        Err(VideoError::Validation(format!(
            "unsupported content type {content_type:?}"
        )))
    }
}

/// Returns the lower-cased extension including the leading dot.
pub fn validate_extension(filename: &str, allowed: &[String]) -> Result<String, VideoError> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .ok_or_else(|| VideoError::Validation(format!("file {filename:?} has no extension")))?;

    let allowed = allowed.iter().any(|a| {
        let a = a.trim();
        a.eq_ignore_ascii_case(&extension) || a.eq_ignore_ascii_case(&extension[1..])
    });

    if allowed {
        Ok(extension)
    } else {
        Err(VideoError::Validation(format!(
            "unsupported file extension {extension:?}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// ISO base media (MP4, MOV): `ftyp` box at offset 4.
    IsoMedia,
    /// EBML header (WebM, Matroska).
    Ebml,
    /// RIFF (AVI).
    Riff,
}

const EBML_MAGIC: &[u8] = &[0x1a, 0x45, 0xdf, 0xa3];

pub fn detect_container(header: &[u8]) -> Option<Container> {
    if header.len() >= 8 && &header[4..8] == b"ftyp" {
        Some(Container::IsoMedia)
    } else if header.starts_with(EBML_MAGIC) {
        Some(Container::Ebml)
    } else if header.starts_with(b"RIFF") {
        Some(Container::Riff)
    } else {
        None
    }
}

/// Reads the leading bytes, checks the signature and rewinds the stream.
pub async fn sniff_container<R>(reader: &mut R) -> Result<Container, VideoError>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    let mut header = Vec::with_capacity(limits::MAGIC_HEADER_BYTES);
    let io_error = |e: std::io::Error| VideoError::Validation(format!("unreadable upload: {e}"));

    (&mut *reader)
        .take(limits::MAGIC_HEADER_BYTES as u64)
        .read_to_end(&mut header)
        .await
        .map_err(io_error)?;

    reader.seek(SeekFrom::Start(0)).await.map_err(io_error)?;

    detect_container(&header).ok_or_else(|| {
        VideoError::Validation("file content is not a recognized video container".to_string())
    })
}

/// Trims, keeps the first 200 characters and HTML-escapes the result.
///
/// # Examples
///
/// ```rust
/// use gooji::services::upload::sanitize_input;
///
/// assert_eq!(sanitize_input("  <b>hi</b> "), "&lt;b&gt;hi&lt;/b&gt;");
/// ```
pub fn sanitize_input(input: &str) -> String {
    escape_truncated(input, limits::MAX_TEXT_CHARS)
}

/// The cut happens on the raw text so an entity is never split.
fn escape_truncated(input: &str, max_chars: usize) -> String {
    let truncated: String = input.trim().chars().take(max_chars).collect();
    html_escape::encode_quoted_attribute(&truncated).into_owned()
}

/// Sanitizes each tag, caps it at 50 characters and drops empties. Falls back
/// to the default tag set when nothing is left.
pub fn sanitize_tags(tags: &[String]) -> Vec<String> {
    let sanitized: Vec<String> = tags
        .iter()
        .map(|tag| escape_truncated(tag, limits::MAX_TAG_CHARS))
        .filter(|tag| !tag.is_empty())
        .collect();

    if sanitized.is_empty() {
        DEFAULT_TAGS.iter().map(ToString::to_string).collect()
    } else {
        sanitized
    }
}

/// `<unix-seconds>_<uuid-v4-simple>`.
pub fn generate_video_id() -> String {
    format!(
        "{}_{}",
        chrono::Utc::now().timestamp(),
        uuid::Uuid::new_v4().simple()
    )
}
