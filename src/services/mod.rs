pub mod media;
pub use media::{FfmpegInspector, InspectionError, MediaInspector};

pub mod thumbnails;
pub use thumbnails::{ThumbnailJob, ThumbnailQueue};

pub mod upload;
pub use upload::{UploadSource, UploadStream};

pub mod video_service;
pub mod video_service_impl;
pub use video_service::{VideoError, VideoService};
pub use video_service_impl::DefaultVideoService;
