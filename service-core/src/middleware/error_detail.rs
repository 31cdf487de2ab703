use crate::error::ErrorDetail;
use crate::json_api::error_object;
use axum::{
    Json,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Whether error responses may carry their details in `meta.data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposeErrorDetails(pub bool);

/// Re-renders `AppError` responses with their details when exposure is on.
pub async fn error_detail_middleware(
    State(expose): State<ExposeErrorDetails>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;

    let Some(detail) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if !expose.0 {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    (
        parts,
        Json(error_object(Some(&detail.message), detail.metadata)),
    )
        .into_response()
}
