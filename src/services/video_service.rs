//! Domain service for video ingestion, lookup and removal.
//!
//! This module provides the [`VideoService`] trait, which HTTP handlers and
//! CLI commands use instead of touching storage or the media tool directly.

use super::media::InspectionError;
use super::upload::UploadSource;
use crate::domain::{DeleteReport, ErrorKind};
use crate::models::video::{UploadMetadata, VideoRecord};
use crate::storage::{SecurityError, StorageError};
use std::path::PathBuf;
use thiserror::Error;

/// Domain errors for video operations.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("video {0} not found")]
    NotFound(String),

    #[error("media inspection failed: {0}")]
    Inspection(#[source] InspectionError),

    #[error("storage failure: {0}")]
    Storage(#[source] StorageError),
}

impl VideoError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Security(_) => ErrorKind::Security,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Inspection(_) => ErrorKind::Inspection,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<InspectionError> for VideoError {
    fn from(err: InspectionError) -> Self {
        match err {
            InspectionError::InvalidTimestamp(_) => Self::Validation(err.to_string()),
            InspectionError::Security(e) => Self::Security(e),
            other => Self::Inspection(other),
        }
    }
}

impl From<StorageError> for VideoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Security(e) => Self::Security(e),
            StorageError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Domain service trait for video operations.
#[async_trait::async_trait]
pub trait VideoService: Send + Sync {
    /// Validates, stores and inspects an upload, then persists its record and
    /// schedules a thumbnail.
    ///
    /// # Errors
    ///
    /// - [`VideoError::Validation`] when size, type, extension or signature is
    ///   rejected; nothing is written in that case
    /// - [`VideoError::Inspection`] when the media tool cannot read the file;
    ///   the stored video is removed
    /// - [`VideoError::Storage`] when a write fails; the stored video is removed
    async fn process_upload(
        &self,
        source: UploadSource,
        metadata: UploadMetadata,
    ) -> Result<VideoRecord, VideoError>;

    /// # Errors
    ///
    /// - [`VideoError::NotFound`] if no record exists
    /// - [`VideoError::Security`] if the id is not a safe file name
    async fn get_video(&self, id: &str) -> Result<VideoRecord, VideoError>;

    /// All readable records, newest first.
    async fn list_videos(&self) -> Result<Vec<VideoRecord>, VideoError>;

    /// Removes the video, its record and its thumbnail. Missing artifacts are
    /// not an error; the report says what happened to each.
    async fn delete_video(&self, id: &str) -> Result<DeleteReport, VideoError>;

    /// Path of the stored video bytes.
    async fn video_file(&self, id: &str) -> Result<PathBuf, VideoError>;

    /// Path of the generated thumbnail.
    async fn thumbnail_file(&self, id: &str) -> Result<PathBuf, VideoError>;
}
