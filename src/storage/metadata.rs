use super::{StorageError, path_guard, remove_artifact};
use crate::domain::ArtifactOutcome;
use crate::models::video::VideoRecord;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// One JSON document per video under the metadata directory.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    dir: PathBuf,
}

impl MetadataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        path_guard::validate_file_name(id)?;
        let path = self.dir.join(format!("{id}.json"));
        path_guard::validate(&path, &self.dir)?;
        Ok(path)
    }

    /// Writes the record, replacing any previous document with the same id.
    pub async fn save(&self, record: &VideoRecord) -> Result<(), StorageError> {
        let path = self.record_path(&record.id)?;

        let json = serde_json::to_vec_pretty(record).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;

        fs::write(&path, json)
            .await
            .map_err(|e| StorageError::io("write", &path, e))?;

        debug!(id = %record.id, "Saved metadata to {:?}", path);
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<VideoRecord, StorageError> {
        let path = self.record_path(id)?;

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()));
            }
            Err(e) => return Err(StorageError::io("read", &path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| StorageError::Json { path, source })
    }

    /// Every readable record, newest first. Unparsable documents are skipped.
    pub async fn list(&self) -> Result<Vec<VideoRecord>, StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io("create", &self.dir, e))?;

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| StorageError::io("read", &self.dir, e))?;

        let mut records = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io("read", &self.dir, e))?
        {
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            if let Ok(file_type) = entry.file_type().await
                && !file_type.is_file()
            {
                continue;
            }

            match read_record(&path).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable metadata {:?}: {}", path, e),
            }
        }

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(records)
    }

    pub async fn delete(&self, id: &str) -> ArtifactOutcome {
        match self.record_path(id) {
            Ok(path) => remove_artifact(&path).await,
            Err(e) => ArtifactOutcome::Rejected(e.to_string()),
        }
    }
}

async fn read_record(path: &Path) -> Result<VideoRecord, StorageError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| StorageError::io("read", path, e))?;

    serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}
