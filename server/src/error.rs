//! HTTP error mapping.
//!
//! Store errors become `{"detail": ...}` JSON bodies: validation → 422,
//! missing rows → 404, anything from SQLite → 500 with a generic message
//! (the underlying error is logged, not returned).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug)]
pub struct AppError(pub StoreError);

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            StoreError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            StoreError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            StoreError::Database(err) => {
                tracing::error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal storage error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
