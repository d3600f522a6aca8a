//! Error responses for the ID endpoint.
//!
//! Every failure maps to `500 {"error":true}`; the cause only goes to the
//! log. Clients are expected to retry, and to stop retrying an instance whose
//! `/health` reports it retired.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::server::service::handler::NextIdResponse;

/// Unified error type for the HTTP surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The generator could not produce an ID.
    #[error("ID generation failed: {0}")]
    IdGeneration(#[from] nextid::Error),

    /// A fatal error was observed earlier; this instance no longer issues IDs.
    #[error("generator is retired")]
    Retired,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(NextIdResponse::failed()),
        )
            .into_response()
    }
}
