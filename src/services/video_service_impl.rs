use super::media::MediaInspector;
use super::thumbnails::{ThumbnailJob, ThumbnailQueue};
use super::upload::{self, UploadSource};
use super::video_service::{VideoError, VideoService};
use crate::config::VideoConfig;
use crate::domain::{ArtifactOutcome, DeleteReport};
use crate::models::video::{UploadMetadata, VideoRecord};
use crate::storage::{MetadataStore, StoredVideo, VideoStore, path_guard};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct DefaultVideoService {
    videos: VideoStore,
    inspector: Arc<dyn MediaInspector>,
    thumbnails: Arc<ThumbnailQueue>,
    policy: VideoConfig,
    thumbnail_timestamp: f64,
}

impl DefaultVideoService {
    #[must_use]
    pub const fn new(
        videos: VideoStore,
        inspector: Arc<dyn MediaInspector>,
        thumbnails: Arc<ThumbnailQueue>,
        policy: VideoConfig,
        thumbnail_timestamp: f64,
    ) -> Self {
        Self {
            videos,
            inspector,
            thumbnails,
            policy,
            thumbnail_timestamp,
        }
    }

    const fn metadata(&self) -> &MetadataStore {
        self.videos.metadata()
    }

    fn validate_id(id: &str) -> Result<(), VideoError> {
        if id.is_empty() {
            return Err(VideoError::Validation("video id is required".to_string()));
        }
        path_guard::validate_file_name(id)?;
        Ok(())
    }

    async fn rollback(&self, stored: &StoredVideo, reason: &str) {
        match self.videos.discard(stored).await {
            ArtifactOutcome::Deleted | ArtifactOutcome::Absent => {
                debug!("Removed {:?} after {}", stored.path, reason);
            }
            outcome => {
                warn!(?outcome, "Could not remove {:?} after {}", stored.path, reason);
            }
        }
    }

    async fn ingest(
        &self,
        mut source: UploadSource,
        metadata: UploadMetadata,
    ) -> Result<VideoRecord, VideoError> {
        upload::validate_size(source.size, self.policy.max_size)?;
        upload::validate_content_type(&source.content_type, &self.policy.allowed_types)?;
        let extension =
            upload::validate_extension(&source.filename, &self.policy.allowed_extensions)?;
        let container = upload::sniff_container(source.reader.as_mut()).await?;
        debug!(?container, filename = %source.filename, "Upload passed validation");

        let id = upload::generate_video_id();
        let filename = format!("{id}{extension}");

        let stored = self
            .videos
            .save(source.reader.as_mut(), &filename)
            .await?;

        if stored.bytes > self.policy.max_size {
            self.rollback(&stored, "size limit exceeded").await;
            return Err(VideoError::Validation(format!(
                "file too large: exceeds the {} byte limit",
                self.policy.max_size
            )));
        }

        let info = match self.inspector.validate_video(&stored.path).await {
            Ok(info) => info,
            Err(e) => {
                self.rollback(&stored, "inspection failure").await;
                return Err(e.into());
            }
        };

        if !info.has_video() {
            warn!(id = %id, "No video stream dimensions reported for {:?}", stored.path);
        }

        let record = VideoRecord {
            id: id.clone(),
            filename,
            title: upload::sanitize_input(&metadata.title),
            description: upload::sanitize_input(&metadata.description),
            duration: info.duration,
            created_at: Utc::now(),
            tags: upload::sanitize_tags(&metadata.tags),
        };

        if let Err(e) = self.metadata().save(&record).await {
            self.rollback(&stored, "metadata failure").await;
            return Err(e.into());
        }

        match self.videos.thumbnail_path(&id) {
            Ok(output_path) => {
                self.thumbnails.enqueue(ThumbnailJob {
                    video_id: id.clone(),
                    video_path: stored.path.clone(),
                    output_path,
                    timestamp_secs: self.thumbnail_timestamp,
                });
            }
            Err(e) => warn!(id = %id, "Skipping thumbnail: {}", e),
        }

        info!(
            id = %record.id,
            bytes = stored.bytes,
            duration = record.duration,
            "Processed video upload"
        );

        Ok(record)
    }
}

#[async_trait::async_trait]
impl VideoService for DefaultVideoService {
    #[instrument(skip_all, fields(filename = %source.filename))]
    async fn process_upload(
        &self,
        source: UploadSource,
        metadata: UploadMetadata,
    ) -> Result<VideoRecord, VideoError> {
        let result = self.ingest(source, metadata).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind().as_str(),
        };
        metrics::counter!("uploads_total", "outcome" => outcome).increment(1);

        result
    }

    async fn get_video(&self, id: &str) -> Result<VideoRecord, VideoError> {
        Self::validate_id(id)?;
        Ok(self.metadata().get(id).await?)
    }

    async fn list_videos(&self) -> Result<Vec<VideoRecord>, VideoError> {
        Ok(self.metadata().list().await?)
    }

    async fn delete_video(&self, id: &str) -> Result<DeleteReport, VideoError> {
        Self::validate_id(id)?;
        Ok(self.videos.delete(id).await)
    }

    async fn video_file(&self, id: &str) -> Result<PathBuf, VideoError> {
        Self::validate_id(id)?;
        self.videos
            .video_path(id)
            .await
            .ok_or_else(|| VideoError::NotFound(id.to_string()))
    }

    async fn thumbnail_file(&self, id: &str) -> Result<PathBuf, VideoError> {
        Self::validate_id(id)?;
        let path = self.videos.thumbnail_path(id)?;

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(path)
        } else {
            Err(VideoError::NotFound(id.to_string()))
        }
    }
}
