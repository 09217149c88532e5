//! # ApiError
//!
//! Maps [`DomainError`] onto HTTP. Bodies are always
//! `{"error": <code>, "message": <text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde::Serialize;

use crate::metrics::DenialReason;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub error: DomainError,
    denial: Option<DenialReason>,
}

impl ApiError {
    /// A role-gate refusal, as opposed to a record-level one.
    pub fn role_denied(error: DomainError) -> Self {
        Self {
            error,
            denial: Some(DenialReason::Role),
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            DomainError::MissingCredential
            | DomainError::MalformedCredential
            | DomainError::InvalidCredential => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::InvalidTransition { .. } | DomainError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.error {
            DomainError::MissingCredential => "missing_credential",
            DomainError::MalformedCredential => "malformed_credential",
            DomainError::InvalidCredential => "invalid_credential",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::NotFound(_) => "not_found",
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidTransition { .. } => "invalid_transition",
            DomainError::Conflict(_) => "conflict",
            DomainError::Storage(_) => "internal_error",
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        let denial = if error.is_credential_error() {
            Some(DenialReason::Credential)
        } else if matches!(error, DomainError::Forbidden(_)) {
            Some(DenialReason::Ownership)
        } else {
            None
        };
        Self { error, denial }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.error {
            DomainError::Storage(detail) => {
                tracing::error!(%detail, "storage failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.code(),
            message,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(reason) = self.denial {
            response.extensions_mut().insert(reason);
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
