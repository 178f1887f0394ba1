use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::domain::ErrorKind;
use crate::services::VideoError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Forbidden(String),

    InspectionError(String),

    StorageError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::InspectionError(msg) => write!(f, "Inspection error: {}", msg),
            ApiError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::ValidationError(_) => ErrorKind::Validation,
            ApiError::Forbidden(_) => ErrorKind::Security,
            ApiError::InspectionError(_) => ErrorKind::Inspection,
            ApiError::StorageError(_) => ErrorKind::Storage,
            ApiError::InternalError(_) => ErrorKind::Internal,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = StatusCode::from_u16(kind.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_message = match self {
            ApiError::NotFound(msg) | ApiError::ValidationError(msg) => msg,
            ApiError::Forbidden(msg) => {
                tracing::warn!("Rejected unsafe request: {}", msg);
                "Access to the requested path is not allowed".to_string()
            }
            ApiError::InspectionError(msg) => {
                tracing::error!("Media inspection error: {}", msg);
                "The video could not be processed".to_string()
            }
            ApiError::StorageError(msg) => {
                tracing::error!("Storage error: {}", msg);
                "A storage error occurred".to_string()
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        };

        let body = ApiResponse::<()>::error(error_message).with_kind(kind);
        (status, Json(body)).into_response()
    }
}

impl From<VideoError> for ApiError {
    fn from(err: VideoError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::ValidationError(message),
            ErrorKind::Security => Self::Forbidden(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Inspection => Self::InspectionError(message),
            ErrorKind::Storage => Self::StorageError(message),
            ErrorKind::Internal => Self::InternalError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SecurityError;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_follows_kind() {
        let (status, json) = body_json(ApiError::validation("title too long")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["error"], "title too long");

        let err = ApiError::from(VideoError::NotFound("abc".to_string()));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_forbidden_and_server_errors_hide_detail() {
        let err = ApiError::from(VideoError::Security(SecurityError::Traversal(
            "../etc/passwd".to_string(),
        )));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!json["error"].as_str().unwrap().contains("passwd"));

        let (status, json) = body_json(ApiError::StorageError("/srv/disk full".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "storage");
        assert!(!json["error"].as_str().unwrap().contains("/srv"));
    }
}
