//! JSON:API style response envelope.
//!
//! Every JSON body served by the workspace has the shape
//!
//! ```json
//! { "data": ..., "meta": { "status": "success", "message": "...", "data": {} } }
//! ```
//!
//! `meta.data` carries auxiliary information (application identity on the
//! health endpoint, error details for client errors).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Completed successfully.";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error has occurred. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub status: Status,
    pub message: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Document<T> {
    pub data: T,
    pub meta: Meta,
}

impl<T: Serialize> Document<T> {
    pub fn new(data: T, status: Status, message: impl Into<String>, metadata: Value) -> Self {
        Self {
            data,
            meta: Meta {
                status,
                message: message.into(),
                data: metadata,
            },
        }
    }
}

/// Empty `meta.data` object.
pub fn no_metadata() -> Value {
    Value::Object(Map::new())
}

pub fn success_object<T: Serialize>(
    data: T,
    message: Option<&str>,
    metadata: Value,
) -> Document<T> {
    Document::new(
        data,
        Status::Success,
        message.unwrap_or(DEFAULT_SUCCESS_MESSAGE),
        metadata,
    )
}

/// Error documents always carry `data: false`.
pub fn error_object(message: Option<&str>, metadata: Value) -> Document<bool> {
    Document::new(
        false,
        Status::Error,
        message.unwrap_or(DEFAULT_ERROR_MESSAGE),
        metadata,
    )
}

/// A status code paired with a JSON:API document.
pub struct JsonApi<T>(pub StatusCode, pub Document<T>);

impl<T: Serialize> JsonApi<T> {
    pub fn success(data: T, message: &str, metadata: Value) -> Self {
        Self(StatusCode::OK, success_object(data, Some(message), metadata))
    }
}

impl JsonApi<bool> {
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self(status, error_object(Some(message), no_metadata()))
    }
}

impl<T: Serialize> IntoResponse for JsonApi<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}
