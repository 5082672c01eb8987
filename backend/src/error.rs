//! Error handling for the NDVI monitoring server
//!
//! Provides consistent error responses in English and Russian. Only input
//! validation, ownership and persistence failures ever reach a caller; the
//! provider stages of an analysis recover locally.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_ru: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_ru: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure on a single named input
    pub fn invalid(field: &str, message: &str, message_ru: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_ru: message_ru.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_default();
        AppError::Validation {
            message: format!("Invalid value for {}", field),
            message_ru: format!("Недопустимое значение поля {}", field),
            field,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub message_ru: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>, message_ru: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            error: error.into(),
            code: code.to_string(),
            message_ru: message_ru.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("TOKEN_EXPIRED", "Token has expired", "Срок действия токена истёк"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("INVALID_TOKEN", "Invalid token", "Недействительный токен"),
            ),
            AppError::Unauthorized { message, message_ru } => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("UNAUTHORIZED", message.clone(), message_ru.clone()),
            ),
            AppError::Validation {
                field,
                message,
                message_ru,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    field: Some(field.clone()),
                    ..ErrorResponse::new("VALIDATION_ERROR", message.clone(), message_ru.clone())
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "VALIDATION_ERROR",
                    msg.clone(),
                    format!("Некорректные данные: {}", msg),
                ),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("{} не найдено", resource),
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(
                    "CONFIGURATION_ERROR",
                    format!("Configuration error: {}", msg),
                    format!("Ошибка конфигурации: {}", msg),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(
                    "DATABASE_ERROR",
                    "A database error occurred",
                    "Ошибка базы данных",
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", msg.clone(), "Внутренняя ошибка сервера"),
            ),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {:?}", self);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::invalid("lat", "bad", "плохо").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Field".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse {
            field: Some("lat".into()),
            ..ErrorResponse::new("VALIDATION_ERROR", "bad", "плохо")
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "bad");
        assert_eq!(json["field"], "lat");
    }
}
