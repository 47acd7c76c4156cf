use serde::Serialize;

use crate::handler::params::Params;
use crate::handler::{ApiHandler, ApiHandlerError, ApiResponse};
use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;

/// Handler used by the `apinet` binary: it echoes back what the connection
/// layer assembled, which makes the server usable for smoke tests.
pub struct EchoHandler;

#[derive(Debug, Serialize)]
pub struct Echo {
    pub path: String,
    pub params: Params,
}

impl ApiHandler for EchoHandler {
    type Output = Echo;

    async fn service(
        &self,
        path: &str,
        params: &Params,
        _headers: &HttpHeaders,
    ) -> Result<ApiResponse<Echo>, ApiHandlerError> {
        if path == "/" || path.is_empty() {
            return Err(ApiHandlerError::new(HttpStatus::NOT_FOUND, "no endpoint given"));
        }

        Ok(ApiResponse::ok(Echo {
            path: path.to_string(),
            params: params.clone(),
        }))
    }
}
