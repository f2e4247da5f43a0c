use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::errors::EngineError;

/// Error type returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    BadRequest(String),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::BadRequest(msg) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response();
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response();
            }
            ApiError::Engine(err) => err,
        };
        err.into_response()
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            EngineError::NotAuthenticated | EngineError::TokenRefreshFailed(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": self.to_string(), "auth_required": true }),
            ),
            EngineError::NoCandidates(detail) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "no track available", "detail": detail }),
            ),
            EngineError::Upstream {
                collaborator,
                message,
            } => {
                error!(collaborator = %collaborator, error = %message, "upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": self.to_string(), "collaborator": collaborator.to_string() }),
                )
            }
            EngineError::AnalysisUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": self.to_string() }),
            ),
            EngineError::Config(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": self.to_string() }),
            ),
            EngineError::Store(msg) => {
                error!(error = %msg, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
