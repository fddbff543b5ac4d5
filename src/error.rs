use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// AppError
///
/// Every failure a handler can produce. Each variant carries the message that is
/// sent back to the client; internal variants keep their source for logging only.
#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected input (422).
    #[error("{0}")]
    Validation(String),
    /// Missing, malformed, expired or wrongly signed bearer token (401).
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    /// Uniqueness violation. Reported as 422 to match the validation family.
    #[error("{0}")]
    Conflict(String),
    #[error("File too large")]
    FileTooLarge,
    #[error("Invalid Input Type.")]
    InvalidImageType,
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("password hashing error")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("token signing error")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("file system error")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::InvalidImageType => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::FileTooLarge => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Hashing(_)
            | AppError::Token(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_)
            | AppError::Hashing(_)
            | AppError::Token(_)
            | AppError::Io(_)
            | AppError::Internal(_) => "An unknown error occurred!".to_string(),
            other => other.to_string(),
        }
    }
}

/// ErrorEnvelope
///
/// Wire shape of every error response: `{"errors": {"status": 422, "message": "..."}}`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorEnvelope {
    pub errors: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error.cause_chain = ?self, error.message = %self, "request failed");
        }

        let body = ErrorEnvelope {
            errors: ErrorDetail {
                status: status.as_u16(),
                message: self.client_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge
        } else {
            AppError::Validation(err.body_text())
        }
    }
}
