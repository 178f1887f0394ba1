pub mod media;
pub mod video;

pub use media::VideoInfo;
pub use video::{UploadMetadata, VideoRecord};
