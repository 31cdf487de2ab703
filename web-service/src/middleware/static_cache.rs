use service_core::axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

const NO_CACHE: &str = "public, max-age=0";
const THIRTY_DAYS: &str = "public, max-age=2592000";
const NINETY_DAYS: &str = "public, max-age=7776000";
const ONE_DAY: &str = "public, max-age=86400";

/// `Cache-Control` value for a static file of the given MIME type.
pub fn cache_control_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/javascript"
        | "application/x-javascript"
        | "text/javascript"
        | "text/x-javascript"
        | "text/html" => NO_CACHE,
        "application/pdf" | "image/gif" | "image/jpeg" | "image/png" | "image/svg+xml"
        | "image/x-icon" | "image/vnd.microsoft.icon" => THIRTY_DAYS,
        "audio/mpeg" | "audio/ogg" | "audio/wav" | "audio/x-wav" | "video/avi"
        | "video/x-msvideo" => NINETY_DAYS,
        _ => ONE_DAY,
    }
}

/// Sets `Cache-Control` on successful static file responses from their `Content-Type`.
pub async fn static_cache_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    if !response.status().is_success() {
        return response;
    }

    let policy = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(cache_control_for)
        .unwrap_or(ONE_DAY);

    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(policy));
    // Static files are revalidated by max-age only.
    response.headers_mut().remove(header::ETAG);

    response
}
