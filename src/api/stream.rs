use axum::{
    extract::{Query, Request, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeFile;

use super::validation::validate_video_id;
use super::{ApiError, AppState, IdQuery};

/// `GET /api/video?id=`
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdQuery>,
    req: Request,
) -> Result<Response, ApiError> {
    let id = validate_video_id(params.id.as_deref())?;
    let path = state.shared.video_service.video_file(id).await?;
    serve_file(path, req).await
}

/// `GET /api/thumbnails?id=`
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdQuery>,
    req: Request,
) -> Result<Response, ApiError> {
    let id = validate_video_id(params.id.as_deref())?;
    let path = state.shared.video_service.thumbnail_file(id).await?;
    serve_file(path, req).await
}

/// Serves the file with `Range` and conditional request support.
pub(super) async fn serve_file(path: PathBuf, req: Request) -> Result<Response, ApiError> {
    let headers = req.headers();

    let mut builder = axum::http::Request::builder().method(req.method());
    for name in ["range", "if-range", "if-modified-since", "if-unmodified-since"] {
        if let Some(value) = headers.get(name) {
            builder = builder.header(name, value.clone());
        }
    }

    let file_req = builder
        .body(axum::body::Body::empty())
        .map_err(|e| ApiError::internal(format!("Failed to build request: {e}")))?;

    match ServeFile::new(path).try_call(file_req).await {
        Ok(res) => {
            let mut res = res.into_response();
            res.headers_mut()
                .insert("accept-ranges", HeaderValue::from_static("bytes"));
            Ok(res)
        }
        Err(e) => Err(ApiError::internal(format!("Streaming error: {e}"))),
    }
}
