//! HTTP error mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::error::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Dataset not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::NotFound => json!({ "detail": "Dataset not found" }),
            Self::Validation(message) => {
                warn!(detail = %message, "Validation error");
                json!({ "detail": [{ "msg": message }] })
            }
            Self::Unauthenticated | Self::Forbidden => json!({ "detail": self.to_string() }),
            Self::Internal(e) => {
                error!(error = %e, "Unhandled exception");
                json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
