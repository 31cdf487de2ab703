use service_core::axum::{http::StatusCode, response::IntoResponse};
use service_core::observability::get_metrics;

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        get_metrics(),
    )
}
