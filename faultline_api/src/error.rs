//! Error types for the Faultline service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use faultline_core::AnomalyError;
use serde::Serialize;
use thiserror::Error;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Injected or engine-level fault
    #[error(transparent)]
    Anomaly(#[from] AnomalyError),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Anomaly(AnomalyError::Anomalous { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ANOMALOUS_FAULT")
            }
            ApiError::Anomaly(AnomalyError::Aggregate(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AGGREGATE_FAULT")
            }
            ApiError::Anomaly(AnomalyError::Registration(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REGISTRATION_FAULT")
            }
            ApiError::Anomaly(AnomalyError::InvalidOptions(_)) => (StatusCode::BAD_REQUEST, "INVALID_OPTIONS"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::from(AnomalyError::anomalous("/orders")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(AnomalyError::registration("bad kind")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(AnomalyError::InvalidOptions("rate".into())).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_aggregate_code() {
        let err = ApiError::from(AnomalyError::Aggregate(vec![
            AnomalyError::anomalous("*"),
            AnomalyError::anomalous("/a"),
        ]));
        assert_eq!(err.status_and_code().1, "AGGREGATE_FAULT");
    }
}
