use axum::{
    Json,
    extract::{Path, Query, Request, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use super::validation::validate_video_id;
use super::{ApiError, ApiResponse, AppState, IdQuery, stream};

/// `GET /api/videos`
///
/// Returns every record as a JSON array, newest first. With `?id=` the raw
/// video is streamed instead, which is what the gallery player requests.
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdQuery>,
    req: Request,
) -> Result<Response, ApiError> {
    if params.id.is_some() {
        let id = validate_video_id(params.id.as_deref())?;
        let path = state.shared.video_service.video_file(id).await?;
        return stream::serve_file(path, req).await;
    }

    let videos = state.shared.video_service.list_videos().await?;
    Ok(Json(videos).into_response())
}

/// `GET /api/videos/{id}`
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = validate_video_id(Some(&id))?;
    let record = state.shared.video_service.get_video(id).await?;
    Ok(Json(record).into_response())
}

/// `DELETE /api/videos/{id}`
///
/// Succeeds whether or not the artifacts existed.
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_video_id(Some(&id))?;
    let report = state.shared.video_service.delete_video(id).await?;

    info!(id = %id, complete = report.is_complete(), "Delete requested");

    Ok(Json(ApiResponse::ok()))
}
