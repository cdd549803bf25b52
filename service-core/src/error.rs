use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// JSON body returned for every rejected request.
///
/// `code` is a stable, machine-readable identifier; `error` is meant for humans
/// and may change wording between releases.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl ErrorResponse {
    pub fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }

    /// Pair the body with a status code and turn it into a response.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Stable error code reported alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthError(_) => "UNAUTHORIZED",
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::DatabaseError(_) => "STORAGE_ERROR",
            AppError::ConfigError(_) => "CONFIGURATION_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match self {
            AppError::AuthError(err) => ErrorResponse::new(code, err.to_string()),
            // Server-side causes are logged, never echoed back to the caller.
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal error");
                ErrorResponse::new(code, "Internal server error")
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                ErrorResponse::new(code, "Database error")
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                ErrorResponse::new(code, "Configuration error")
            }
        };

        body.into_response_with(status)
    }
}
