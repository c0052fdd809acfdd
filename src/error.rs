use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type, shared by the server and the sync client.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A database pool error.
    #[error("Database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// An authentication error: missing, invalid or expired credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An authorization error: the acting user does not own the resource.
    #[error("Authorization failed")]
    Forbidden,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// The requested item is tombstoned or absent from the local vault.
    #[error("Item is deleted or does not exist")]
    Deleted,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An encryption error: wrong passphrase or corrupted ciphertext.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A network/transport failure on the client side.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Database pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Forbidden => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Deleted => {
                tracing::debug!("Item is deleted or does not exist");
                (
                    StatusCode::NOT_FOUND,
                    "Item is deleted or does not exist".to_string(),
                )
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::Serialization(ref msg) => {
                tracing::debug!("Serialization error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Transport(ref e) => {
                tracing::error!("Transport error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Transport error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
