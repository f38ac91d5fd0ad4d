//! Error taxonomy for the whole pipeline.
//!
//! Four kinds, matching the failure surfaces of the app:
//! - `Upstream`: transport/service-level failure of the generation API
//!   (non-2xx, or a response envelope we cannot read text out of)
//! - `Parse`: problem/solution markers missing or empty in model text
//! - `Validation`: analysis JSON missing required fields or carrying
//!   non-coercible numerics
//! - `Storage`: persistence read/write failure
//!
//! All of them surface to the client as a JSON `{ "message": ... }` body.
//! Nothing is retried here; a manual retry is the UI's job.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("upstream service error: {0}")]
    Upstream(String),
    #[error("could not parse problem/solution from model output: {0}")]
    Parse(String),
    #[error("invalid analysis data: {0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Wire shape of every error reply.
#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            // Model produced text we could not use; not the client's fault,
            // but not a transport failure either.
            Error::Parse(_) | Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { message: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_the_inner_message() {
        let e = Error::Upstream("HTTP 503: overloaded".into());
        assert!(e.to_string().contains("HTTP 503: overloaded"));
    }
}
