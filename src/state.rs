use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    DefaultVideoService, FfmpegInspector, MediaInspector, ThumbnailQueue, VideoService,
};
use crate::storage::{StorageLayout, VideoStore};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub layout: StorageLayout,

    pub inspector: Arc<dyn MediaInspector>,

    pub thumbnails: Arc<ThumbnailQueue>,

    pub video_service: Arc<dyn VideoService>,
}

impl SharedState {
    /// Prepares the storage layout and locates `ffmpeg`. Must be called from
    /// within a tokio runtime because the thumbnail workers are spawned here.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let layout = StorageLayout::from_config(&config.storage)
            .prepare()
            .map_err(|e| anyhow::anyhow!("Failed to prepare storage: {e}"))?;

        let inspector = FfmpegInspector::new(&config.ffmpeg.path, layout.media_roots())
            .map_err(|e| anyhow::anyhow!("Invalid ffmpeg configuration: {e}"))?;
        tracing::info!("Using ffmpeg at {}", inspector.executable().display());

        Ok(Self::with_inspector(config, layout, Arc::new(inspector)))
    }

    /// Builds the services around an already prepared layout and inspector.
    pub fn with_inspector(
        config: Config,
        layout: StorageLayout,
        inspector: Arc<dyn MediaInspector>,
    ) -> Self {
        let thumbnails = Arc::new(ThumbnailQueue::start(
            inspector.clone(),
            &config.thumbnails,
        ));

        let videos = VideoStore::new(&layout, &config.video.allowed_extensions);

        let video_service = Arc::new(DefaultVideoService::new(
            videos,
            inspector.clone(),
            thumbnails.clone(),
            config.video.clone(),
            config.thumbnails.timestamp_seconds,
        )) as Arc<dyn VideoService + Send + Sync + 'static>;

        Self {
            config: Arc::new(config),
            layout,
            inspector,
            thumbnails,
            video_service,
        }
    }
}
