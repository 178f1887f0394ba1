use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{ApiError, AppState, UploadResponse};
use crate::models::video::UploadMetadata;
use crate::services::UploadSource;

/// The file part after it has been spooled to the temp directory.
struct SpooledFile {
    filename: String,
    content_type: String,
    size: u64,
}

/// `POST /api/videos`
///
/// Expects a multipart body with a `video` file part plus optional `title`,
/// `description` and `tags` parts. `tags` may repeat and may hold a
/// comma-separated list.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let temp_path = state
        .shared
        .layout
        .temp
        .join(format!("upload_{}.part", uuid::Uuid::new_v4().simple()));

    let result = receive_and_ingest(&state, &mut multipart, &temp_path).await;

    if let Err(e) = tokio::fs::remove_file(&temp_path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to remove upload spool {:?}: {}", temp_path, e);
    }

    result
}

async fn receive_and_ingest(
    state: &AppState,
    multipart: &mut Multipart,
    temp_path: &Path,
) -> Result<Json<UploadResponse>, ApiError> {
    let max_size = state.shared.config.video.max_size;
    let mut metadata = UploadMetadata::default();
    let mut spooled = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                if spooled.is_some() {
                    return Err(ApiError::validation("Only one video file may be uploaded"));
                }
                spooled = Some(spool_field(field, temp_path, max_size).await?);
            }
            "title" => metadata.title = field.text().await.map_err(multipart_error)?,
            "description" => metadata.description = field.text().await.map_err(multipart_error)?,
            "tags" => {
                let value = field.text().await.map_err(multipart_error)?;
                metadata.tags.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(ToString::to_string),
                );
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let spooled = spooled.ok_or_else(|| ApiError::validation("No video file provided"))?;

    let file = File::open(temp_path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to reopen upload spool: {e}")))?;

    let source = UploadSource::new(file, spooled.filename, spooled.content_type, spooled.size);
    let record = state
        .shared
        .video_service
        .process_upload(source, metadata)
        .await?;

    Ok(Json(UploadResponse {
        id: record.id,
        filename: record.filename,
    }))
}

/// Copies the file part chunk by chunk, stopping as soon as it exceeds the
/// size limit.
async fn spool_field(
    mut field: Field<'_>,
    temp_path: &Path,
    max_size: u64,
) -> Result<SpooledFile, ApiError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();

    let mut file = File::create(temp_path)
        .await
        .map_err(|e| spool_error(temp_path, &e))?;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > max_size {
            return Err(ApiError::validation(format!(
                "File too large: exceeds the {max_size} byte limit"
            )));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| spool_error(temp_path, &e))?;
    }

    file.flush().await.map_err(|e| spool_error(temp_path, &e))?;

    Ok(SpooledFile {
        filename,
        content_type,
        size,
    })
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::validation(format!("Invalid multipart body: {}", err.body_text()))
}

fn spool_error(path: &Path, err: &std::io::Error) -> ApiError {
    ApiError::StorageError(format!(
        "Failed to spool upload to {}: {err}",
        path.display()
    ))
}
