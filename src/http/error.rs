use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::errors::GridError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Wraps a `GridError` for the HTTP surface; validation failures are the caller's
/// fault (400), everything else is ours.
pub struct ApiError(pub GridError);

impl From<GridError> for ApiError {
    fn from(e: GridError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GridError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GridError::NoPrices(_) => StatusCode::NOT_IMPLEMENTED,
            GridError::InverterTransient(_) | GridError::InverterFatal(_) => StatusCode::BAD_GATEWAY,
            GridError::InternalInvariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
