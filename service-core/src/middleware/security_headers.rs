use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, header},
    middleware::Next,
    response::IntoResponse,
};

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
const X_DNS_PREFETCH_CONTROL: HeaderName = HeaderName::from_static("x-dns-prefetch-control");

/// Adds the hardening headers to every response and announces the service through
/// `X-Powered-By` with the value held in state (the application tag).
pub async fn security_headers_middleware(
    State(powered_by): State<HeaderValue>,
    req: Request,
    next: Next,
) -> impl IntoResponse {
    let mut response = next.run(req).await;

    let serves_page = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));

    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off"));
    // Only send the Referer origin, never the full path.
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("origin"));
    headers.insert(X_POWERED_BY, powered_by);

    if serves_page {
        // Static pages may load their own scripts, styles and images.
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(
                "default-src 'self'; \
                 img-src 'self' data:; \
                 object-src 'none'; \
                 frame-ancestors 'self'",
            ),
        );
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    }

    response
}
