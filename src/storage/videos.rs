use super::{MetadataStore, StorageError, StorageLayout, path_guard, remove_artifact};
use crate::constants::{limits, thumbnails};
use crate::domain::{ArtifactOutcome, DeleteReport};
use std::path::PathBuf;
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVideo {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Raw video bytes under the uploads directory and derived thumbnails.
#[derive(Debug, Clone)]
pub struct VideoStore {
    uploads: PathBuf,
    thumbnails: PathBuf,
    metadata: MetadataStore,
    extensions: Vec<String>,
}

impl VideoStore {
    pub fn new(layout: &StorageLayout, extensions: &[String]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| {
                let ext = ext.trim().to_ascii_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();

        Self {
            uploads: layout.uploads.clone(),
            thumbnails: layout.thumbnails.clone(),
            metadata: MetadataStore::new(&layout.metadata),
            extensions,
        }
    }

    #[must_use]
    pub const fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Streams `reader` into `uploads/<filename>` through a bounded buffer.
    ///
    /// A partially written file is removed when the copy fails.
    pub async fn save<R>(&self, reader: &mut R, filename: &str) -> Result<StoredVideo, StorageError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        path_guard::validate_file_name(filename)?;
        let path = self.uploads.join(filename);
        path_guard::validate(&path, &self.uploads)?;

        let mut file = File::create(&path)
            .await
            .map_err(|e| StorageError::io("create", &path, e))?;

        let mut buffered = BufReader::with_capacity(limits::COPY_BUFFER_BYTES, reader);
        let copied = match tokio::io::copy_buf(&mut buffered, &mut file).await {
            Ok(bytes) => file.flush().await.map(|()| bytes),
            Err(e) => Err(e),
        };

        match copied {
            Ok(bytes) => {
                debug!("Stored {} bytes at {:?}", bytes, path);
                Ok(StoredVideo { path, bytes })
            }
            Err(e) => {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&path).await {
                    warn!("Failed to remove partial upload {:?}: {}", path, cleanup);
                }
                Err(StorageError::io("write", &path, e))
            }
        }
    }

    /// `uploads/<id><ext>` for every allowed extension.
    pub fn candidate_paths(&self, id: &str) -> Result<Vec<PathBuf>, StorageError> {
        path_guard::validate_file_name(id)?;

        self.extensions
            .iter()
            .map(|ext| {
                let path = self.uploads.join(format!("{id}{ext}"));
                path_guard::validate(&path, &self.uploads)?;
                Ok(path)
            })
            .collect()
    }

    pub async fn video_path(&self, id: &str) -> Option<PathBuf> {
        for path in self.candidate_paths(id).ok()? {
            if fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    /// False on any validation failure.
    pub async fn exists(&self, id: &str) -> bool {
        self.video_path(id).await.is_some()
    }

    pub fn thumbnail_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        path_guard::validate_file_name(id)?;
        let path = self
            .thumbnails
            .join(format!("{id}.{}", thumbnails::EXTENSION));
        path_guard::validate(&path, &self.thumbnails)?;
        Ok(path)
    }

    /// Removes a file this store wrote, used to roll back a failed ingestion.
    pub async fn discard(&self, stored: &StoredVideo) -> ArtifactOutcome {
        if let Err(e) = path_guard::validate(&stored.path, &self.uploads) {
            return ArtifactOutcome::Rejected(e.to_string());
        }
        remove_artifact(&stored.path).await
    }

    pub async fn remove_video(&self, id: &str) -> ArtifactOutcome {
        let paths = match self.candidate_paths(id) {
            Ok(paths) => paths,
            Err(e) => return ArtifactOutcome::Rejected(e.to_string()),
        };

        let mut outcome = ArtifactOutcome::Absent;
        for path in paths {
            match remove_artifact(&path).await {
                ArtifactOutcome::Deleted if !outcome.is_failure() => {
                    outcome = ArtifactOutcome::Deleted;
                }
                failure @ (ArtifactOutcome::Failed(_) | ArtifactOutcome::Rejected(_)) => {
                    outcome = failure;
                }
                _ => {}
            }
        }
        outcome
    }

    /// Attempts all three artifacts independently; absence is not an error.
    pub async fn delete(&self, id: &str) -> DeleteReport {
        let video = self.remove_video(id).await;
        let metadata = self.metadata.delete(id).await;
        let thumbnail = match self.thumbnail_path(id) {
            Ok(path) => remove_artifact(&path).await,
            Err(e) => ArtifactOutcome::Rejected(e.to_string()),
        };

        let report = DeleteReport {
            video,
            metadata,
            thumbnail,
        };

        if report.is_complete() {
            info!(id = %id, "Deleted video artifacts");
        } else {
            warn!(id = %id, ?report, "Video delete left artifacts behind");
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_layout() -> StorageLayout {
        let root = std::env::temp_dir().join(format!("gooji-videos-{}", uuid::Uuid::new_v4()));
        StorageLayout {
            root: root.clone(),
            uploads: root.join("uploads"),
            temp: root.join("temp"),
            logs: root.join("logs"),
            thumbnails: root.join("thumbnails"),
            metadata: root.join("metadata"),
        }
        .prepare()
        .unwrap()
    }

    fn store(layout: &StorageLayout) -> VideoStore {
        let extensions: Vec<String> = crate::constants::VIDEO_EXTENSIONS
            .iter()
            .map(ToString::to_string)
            .collect();
        VideoStore::new(layout, &extensions)
    }

    #[tokio::test]
    async fn test_save_exists_and_delete_twice() {
        let layout = scratch_layout();
        let store = store(&layout);

        let mut data: &[u8] = b"\x00\x00\x00\x18ftypmp42 payload";
        let stored = store.save(&mut data, "clip_1.mp4").await.unwrap();
        assert_eq!(stored.bytes, 20);
        assert!(store.exists("clip_1").await);
        assert_eq!(store.video_path("clip_1").await, Some(stored.path.clone()));

        tokio::fs::write(store.thumbnail_path("clip_1").unwrap(), b"jpeg")
            .await
            .unwrap();

        let first = store.delete("clip_1").await;
        assert_eq!(first.video, ArtifactOutcome::Deleted);
        assert_eq!(first.metadata, ArtifactOutcome::Absent);
        assert_eq!(first.thumbnail, ArtifactOutcome::Deleted);

        let second = store.delete("clip_1").await;
        assert!(second.is_complete());
        assert_eq!(second.video, ArtifactOutcome::Absent);
        assert!(!store.exists("clip_1").await);

        std::fs::remove_dir_all(&layout.root).ok();
    }

    #[tokio::test]
    async fn test_save_rejects_unsafe_filename() {
        let layout = scratch_layout();
        let store = store(&layout);

        let mut data: &[u8] = b"payload";
        let err = store.save(&mut data, "../escape.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::Security(_)));

        let err = store.save(&mut data, "nested/clip.mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::Security(_)));

        std::fs::remove_dir_all(&layout.root).ok();
    }

    #[tokio::test]
    async fn test_unsafe_id_is_rejected_everywhere() {
        let layout = scratch_layout();
        let store = store(&layout);

        assert!(!store.exists("../metadata/x").await);
        assert!(store.thumbnail_path("a;rm").is_err());

        let report = store.delete("../../etc").await;
        assert!(matches!(report.video, ArtifactOutcome::Rejected(_)));
        assert!(matches!(report.metadata, ArtifactOutcome::Rejected(_)));
        assert!(matches!(report.thumbnail, ArtifactOutcome::Rejected(_)));

        std::fs::remove_dir_all(&layout.root).ok();
    }

    #[test]
    fn test_extensions_are_normalized() {
        let layout = StorageLayout {
            root: PathBuf::from("/srv"),
            uploads: PathBuf::from("/srv/uploads"),
            temp: PathBuf::from("/srv/temp"),
            logs: PathBuf::from("/srv/logs"),
            thumbnails: PathBuf::from("/srv/thumbnails"),
            metadata: PathBuf::from("/srv/metadata"),
        };
        let store = VideoStore::new(&layout, &["MP4".to_string(), ".webm".to_string()]);
        let paths = store.candidate_paths("abc").unwrap();

        assert_eq!(
            paths,
            vec![
                PathBuf::from("/srv/uploads/abc.mp4"),
                PathBuf::from("/srv/uploads/abc.webm"),
            ]
        );
    }
}
