use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::usecases::{credit_ledger::CreditError, processing::ProcessingError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Credit(#[from] CreditError),
}

fn internal(err: &dyn std::fmt::Debug) -> (StatusCode, String) {
    error!(error = ?err, "http: request failed with an internal error");
    // Internal detail stays in the logs.
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Processing(ProcessingError::Internal(err)) => internal(err),
            AppError::Processing(err) => (err.status_code(), err.to_string()),
            AppError::Credit(CreditError::Internal(err)) => internal(err),
            AppError::Credit(err) => (err.status_code(), err.to_string()),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}
