//! Seam between the connection layer and the business logic of the API.
//!
//! The connection layer assembles a request, authenticates it and merges its
//! parameters, then hands it to an [`ApiHandler`]. The handler answers with
//! an [`ApiResponse`] or signals a failure with an [`ApiHandlerError`];
//! both end up as the same JSON envelope on the wire.

pub mod auth;
pub mod echo;
pub mod params;

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;
use params::Params;

/// Envelope written when serializing a response envelope fails.
pub const INTERNAL_ERROR_BODY: &str = r#"{"success":false,"message":"Internal Server Error"}"#;

/// Structured result of one API call.
///
/// The status is not part of the JSON body; it becomes the status line.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    pub status: HttpStatus,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            status: HttpStatus::OK,
            success: true,
            message: None,
            result: Some(result),
        }
    }

    pub fn failure(status: HttpStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            message: Some(message.into()),
            result: None,
        }
    }

    pub fn serialize(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Failure signaled by an [`ApiHandler`]. It is a normal outcome: the
/// status and message are written back as a failure envelope.
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct ApiHandlerError {
    pub status: HttpStatus,
    pub message: String,
}

impl ApiHandlerError {
    pub fn new(status: HttpStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl<T: Serialize> From<ApiHandlerError> for ApiResponse<T> {
    fn from(err: ApiHandlerError) -> Self {
        ApiResponse::failure(err.status, err.message)
    }
}

/// Business logic behind the API.
///
/// `service` is called exactly once per authenticated request, with the
/// request path (query stripped), the merged parameters and the request
/// headers. Its future is awaited before anything is written back, and no
/// timeout is applied to it.
pub trait ApiHandler: Send + Sync + 'static {
    type Output: Serialize + Send;

    fn service(
        &self,
        path: &str,
        params: &Params,
        headers: &HttpHeaders,
    ) -> impl Future<Output = Result<ApiResponse<Self::Output>, ApiHandlerError>> + Send;
}
