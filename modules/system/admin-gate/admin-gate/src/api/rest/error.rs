use axum::response::{IntoResponse, Response};
use http::StatusCode;

/// Last-resort response when the result frame itself failed to encode.
pub(super) fn encode_failure() -> Response {
    tracing::error!("failed to encode operation result frame");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}
