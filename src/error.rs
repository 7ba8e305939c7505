use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// A per-question validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub question_id: String,
    pub message: String,
}

impl FieldError {
    pub fn new(question_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    /// A unique column (slug, email, company name) already holds the value.
    #[error("{0}")]
    Duplicate(String),
    #[error("Some answers are invalid")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a failed insert or update onto a client error where one applies.
    /// Unique-constraint violations report `duplicate_message`.
    pub fn from_write(err: DbErr, duplicate_message: &str) -> Self {
        if let DbErr::RecordNotFound(what) = err {
            return ApiError::NotFound(what);
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::Duplicate(duplicate_message.to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ApiError::BadRequest("A referenced record does not exist".to_string())
            }
            _ => ApiError::Database(err),
        }
    }

    pub fn missing(field: &str) -> Self {
        ApiError::BadRequest(format!("{field} is required"))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::Duplicate(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                tracing::error!("{self}");
                serde_json::json!({ "error": "An unexpected error occurred" })
            }
            ApiError::Validation(errors) => {
                let fields: BTreeMap<&str, &str> = errors
                    .iter()
                    .map(|e| (e.question_id.as_str(), e.message.as_str()))
                    .collect();
                serde_json::json!({ "error": self.to_string(), "fields": fields })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Treat `None` and blank strings alike as a missing field.
pub fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::missing(field))
}
