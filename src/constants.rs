pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".avi", ".mov"];

pub const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4", "video/webm", "video/avi", "video/mov"];

/// Tags applied when an upload carries none that survive sanitization.
pub const DEFAULT_TAGS: &[&str] = &["ojibwe", "language", "culture"];

pub mod limits {

    pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

    pub const MAX_TEXT_CHARS: usize = 200;

    pub const MAX_TAG_CHARS: usize = 50;

    pub const MAX_ID_CHARS: usize = 128;

    pub const COPY_BUFFER_BYTES: usize = 32 * 1024;

    /// Bytes inspected when sniffing the container signature.
    pub const MAGIC_HEADER_BYTES: usize = 12;

    /// Slack on top of the upload limit for multipart boundaries and text fields.
    pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
}

pub mod thumbnails {

    pub const TIMESTAMP_SECS: f64 = 1.0;

    pub const JPEG_QUALITY: &str = "2";

    pub const EXTENSION: &str = "jpg";
}
