pub mod metadata;
pub mod path_guard;
pub mod videos;

use crate::config::StorageConfig;
use crate::domain::ArtifactOutcome;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use metadata::MetadataStore;
pub use path_guard::SecurityError;
pub use videos::{StoredVideo, VideoStore};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid metadata in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The directories the service owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub root: PathBuf,
    pub uploads: PathBuf,
    pub temp: PathBuf,
    pub logs: PathBuf,
    pub thumbnails: PathBuf,
    pub metadata: PathBuf,
}

impl StorageLayout {
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.base_path),
            uploads: PathBuf::from(&config.uploads),
            temp: PathBuf::from(&config.temp),
            logs: PathBuf::from(&config.logs),
            thumbnails: PathBuf::from(&config.thumbnails),
            metadata: PathBuf::from(&config.metadata),
        }
    }

    /// Creates every directory and returns the layout with canonical paths.
    pub fn prepare(&self) -> Result<Self, StorageError> {
        let prepare_dir = |dir: &Path| -> Result<PathBuf, StorageError> {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::io("create", dir, e))?;
            let canonical = dir
                .canonicalize()
                .map_err(|e| StorageError::io("resolve", dir, e))?;
            debug!("Storage directory ready: {:?}", canonical);
            Ok(canonical)
        };

        Ok(Self {
            root: prepare_dir(&self.root)?,
            uploads: prepare_dir(&self.uploads)?,
            temp: prepare_dir(&self.temp)?,
            logs: prepare_dir(&self.logs)?,
            thumbnails: prepare_dir(&self.thumbnails)?,
            metadata: prepare_dir(&self.metadata)?,
        })
    }

    /// Directories external tools may read from or write to.
    #[must_use]
    pub fn media_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![
            self.root.clone(),
            self.uploads.clone(),
            self.temp.clone(),
            self.thumbnails.clone(),
        ];
        roots.dedup();
        roots
    }
}

/// Removes one file, treating absence as success.
pub(crate) async fn remove_artifact(path: &Path) -> ArtifactOutcome {
    match tokio::fs::remove_file(path).await {
        Ok(()) => ArtifactOutcome::Deleted,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ArtifactOutcome::Absent,
        Err(e) => ArtifactOutcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_creates_and_canonicalizes() {
        let root = std::env::temp_dir().join(format!("gooji-layout-{}", uuid::Uuid::new_v4()));
        let layout = StorageLayout {
            root: root.clone(),
            uploads: root.join("uploads"),
            temp: root.join("temp"),
            logs: root.join("logs"),
            thumbnails: root.join("thumbnails"),
            metadata: root.join("metadata"),
        };

        let prepared = layout.prepare().unwrap();
        assert!(prepared.uploads.is_dir());
        assert!(prepared.metadata.is_absolute());
        assert!(prepared.thumbnails.starts_with(&prepared.root));

        // Idempotent on an existing tree.
        assert_eq!(layout.prepare().unwrap(), prepared);

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_remove_artifact_outcomes() {
        let path = std::env::temp_dir().join(format!("gooji-artifact-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"x").await.unwrap();

        assert_eq!(remove_artifact(&path).await, ArtifactOutcome::Deleted);
        assert_eq!(remove_artifact(&path).await, ArtifactOutcome::Absent);
    }
}
