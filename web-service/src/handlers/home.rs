use service_core::axum::http::StatusCode;
use service_core::json_api::JsonApi;

pub async fn home() -> &'static str {
    "Hello world"
}

/// Answer for paths that match neither a route nor a static file.
pub async fn not_found() -> JsonApi<bool> {
    JsonApi::error(StatusCode::NOT_FOUND, "Not found.")
}
