//! Error types for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use github_client::GitHubError;
use orchestrator::ConnectionError;
use thiserror::Error;

/// Errors that can occur in API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No user identifier header on a request that requires one.
    #[error("missing user identifier header")]
    MissingIdentity,

    /// Requested resource does not exist (or is owned by another user).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Integration connection failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Persistence failure.
    #[error(transparent)]
    Database(#[from] database::DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingIdentity => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Connection(err) => connection_status(err),
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

fn connection_status(err: &ConnectionError) -> (StatusCode, String) {
    match err {
        ConnectionError::InvalidState => (StatusCode::BAD_REQUEST, err.to_string()),
        ConnectionError::UnknownUser(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ConnectionError::NotConnected(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ConnectionError::GitHub(GitHubError::TokenExchange(_)) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ConnectionError::GitHub(e) => {
            tracing::warn!("Upstream GitHub error: {}", e);
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        ConnectionError::Vault(e) => {
            tracing::error!("Vault error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        ConnectionError::Database(e) => {
            tracing::error!("Database error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        let (status, _) = connection_status(&ConnectionError::InvalidState);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = connection_status(&ConnectionError::NotConnected("github"));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_errors_map_to_502() {
        let err = ConnectionError::GitHub(GitHubError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        let (status, _) = connection_status(&err);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
