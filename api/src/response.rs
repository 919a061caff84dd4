//! Response envelope
//!
//! Every API route answers with `{ status, message, data, code? }`.

use axum::{
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Outcome marker carried in the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The uniform JSON wrapper returned by all API routes
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
            code: None,
        }
    }

    /// 201 with the created payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
            code: Some(StatusCode::CREATED.as_u16()),
        }
    }

    fn http_status(&self) -> StatusCode {
        self.code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(match self.status {
                ResponseStatus::Success => StatusCode::OK,
                ResponseStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
            })
    }
}

impl ApiResponse<()> {
    /// Success without a payload (`data: null`)
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: None,
            code: None,
        }
    }

    /// Error envelope; `code` mirrors the HTTP status
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: None,
            code: Some(status.as_u16()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.http_status();
        (status, Json(self)).into_response()
    }
}

/// Wrap error responses that middleware produced without an envelope.
///
/// Axum answers an unsupported method with an empty 405 and the rate limiter
/// rejects with a plain-text 429. Their status and headers (`allow`,
/// `retry-after`, ...) are kept; only the body is replaced.
pub async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let message = match status {
        StatusCode::TOO_MANY_REQUESTS => "Too many requests, please try again later",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        _ => status.canonical_reason().unwrap_or("Request failed"),
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_TYPE);
    parts.headers.remove(CONTENT_LENGTH);
    let (envelope_parts, body) = ApiResponse::error(status, message)
        .into_response()
        .into_parts();
    parts.headers.extend(envelope_parts.headers);
    Response::from_parts(parts, body)
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}
