//! Metrics endpoint and the request-level middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};

use super::AppState;

const REQUEST_ID: &str = "x-request-id";

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; img-src 'self' data: blob:; \
     media-src 'self' blob:; script-src 'self' 'unsafe-inline'; \
     style-src 'self' 'unsafe-inline'; frame-ancestors 'none'; base-uri 'self'";

/// `GET /metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus_handle {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled").into_response(),
    }
}

/// One span and one summary event per request, plus the HTTP counters.
///
/// An incoming `x-request-id` is kept, otherwise one is generated; either way
/// it is echoed on the response.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();

    let request_id = req
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToString::to_string);

    let method = req.method().clone();
    let route = route_label(req.uri().path()).to_string();
    let content_length = req
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let span = info_span!(
        "http",
        request_id = %request_id,
        method = %method,
        route = %route,
    );

    async move {
        let mut response = next.run(req).await;
        let status = response.status();
        let elapsed = started.elapsed();

        let labels = [
            ("method", method.to_string()),
            ("path", route.clone()),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        info!(
            status = status.as_u16(),
            outcome = outcome_label(status),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            request_bytes = content_length,
            "Request finished"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID, value);
        }

        response
    }
    .instrument(span)
    .await
}

fn outcome_label(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "rejected"
    } else {
        "ok"
    }
}

/// Per-video paths collapse to one label.
fn route_label(path: &str) -> &str {
    if path.starts_with("/api/videos/") {
        "/api/videos/{id}"
    } else if path.starts_with("/static/") {
        "/static"
    } else {
        path
    }
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    for (name, value) in [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("referrer-policy", "strict-origin-when-cross-origin"),
        ("content-security-policy", CONTENT_SECURITY_POLICY),
    ] {
        response
            .headers_mut()
            .insert(name, HeaderValue::from_static(value));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_collapses_ids() {
        assert_eq!(route_label("/api/videos/1700000000_abc"), "/api/videos/{id}");
        assert_eq!(route_label("/api/videos"), "/api/videos");
        assert_eq!(route_label("/static/js/app.js"), "/static");
        assert_eq!(route_label("/health"), "/health");
    }

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(StatusCode::OK), "ok");
        assert_eq!(outcome_label(StatusCode::PARTIAL_CONTENT), "ok");
        assert_eq!(outcome_label(StatusCode::FORBIDDEN), "rejected");
        assert_eq!(outcome_label(StatusCode::INTERNAL_SERVER_ERROR), "error");
    }
}
