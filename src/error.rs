//! API error taxonomy and its HTTP mapping.
//!
//! Configuration problems (no database), caller mistakes, missing records and
//! unexpected failures each get their own status so the UI can tell them
//! apart. Internal details are logged, never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::qr::PayloadError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("storage is not configured")]
    StorageUnavailable,

    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("insufficient role")]
    Forbidden,

    #[error("event is full ({0} attendees)")]
    Capacity(u64),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn missing_fields(fields: Vec<&'static str>) -> Self {
        Self::Validation {
            message: format!("missing required fields: {}", fields.join(", ")),
            fields,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Capacity(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::StorageUnavailable => "STORAGE_UNAVAILABLE",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::Capacity(_) => "EVENT_FULL",
            ApiError::Database(_) | ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        ApiError::validation(format!("invalid QR payload: {err}"))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "Internal server error");
                "An internal error occurred".to_string()
            }
            ApiError::StorageUnavailable => {
                tracing::warn!("Request rejected: database is not configured");
                self.to_string()
            }
            _ => self.to_string(),
        };
        let fields = match self {
            ApiError::Validation { fields, .. } => fields,
            _ => Vec::new(),
        };

        let body = ErrorBody {
            code,
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
