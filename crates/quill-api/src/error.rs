use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A business-rule or validation failure: a user-facing message plus the
/// client status code it maps to (400 unless stated otherwise).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DomainError {
    pub message: String,
    pub status: StatusCode,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

/// Everything a domain-service operation can surface: a classified
/// `DomainError`, or an unclassified collaborator failure that the
/// boundary reports as 500 with the raw error text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(e) => (e.status, Json(e.message)).into_response(),
            ApiError::Internal(e) => {
                tracing::error!("unclassified error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(e.to_string())).into_response()
            }
        }
    }
}
