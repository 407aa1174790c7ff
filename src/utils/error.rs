use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::repositories::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Driver messages stay in the logs
        let message = match self {
            AppError::DatabaseError(detail) => {
                log::error!("❌ {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": message
        }))
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(msg) => AppError::Conflict(msg),
            RepositoryError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
