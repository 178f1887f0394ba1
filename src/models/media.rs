use serde::{Deserialize, Serialize};

/// Stream properties reported by the media tool.
///
/// Every field falls back to zero or empty when the tool output does not
/// mention it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl VideoInfo {
    pub fn resolution_str(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    pub const fn has_video(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
