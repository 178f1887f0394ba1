//! Health endpoint.

use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AppState, HealthChecks, HealthResponse};

/// `GET /health`
///
/// Always answers 200; the `checks` object says whether `ffmpeg` is usable
/// and whether the uploads directory is reachable.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ffmpeg = state.shared.inspector.is_available();
    let video_dir = tokio::fs::metadata(&state.shared.layout.uploads)
        .await
        .is_ok_and(|m| m.is_dir());

    let status = if ffmpeg && video_dir {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        pending_thumbnails: state.shared.thumbnails.pending(),
        checks: HealthChecks { ffmpeg, video_dir },
    })
}
