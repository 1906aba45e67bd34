//! Route handlers for the Prism API.

pub mod chat;
pub mod health;
pub mod integrations;
pub mod sessions;

use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

/// Header names the caller may use to supply its opaque user identifier.
/// Two names are accepted for compatibility with older frontend builds.
const IDENTITY_HEADERS: [&str; 2] = ["x-user-id", "x-user-identifier"];

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Chat pipeline
        .route("/api/chat", post(chat::chat))
        // Session listing
        .route("/api/sessions", get(sessions::list_sessions))
        .route("/api/sessions/:id", get(sessions::get_session))
        // Integrations
        .route("/api/integrations/status", get(integrations::status))
        .route(
            "/api/integrations/github/connect",
            get(integrations::github_connect),
        )
        .route(
            "/api/integrations/github/callback",
            get(integrations::github_callback),
        )
        .route(
            "/api/integrations/github",
            delete(integrations::github_disconnect),
        )
        .route(
            "/api/integrations/github/user",
            get(integrations::github_user),
        )
        .route(
            "/api/integrations/github/query",
            post(integrations::github_query),
        )
}

/// Extract the caller-supplied user identifier, under either accepted
/// header name. Absence is a client error.
pub fn require_identity(headers: &HeaderMap) -> Result<String, ApiError> {
    for name in IDENTITY_HEADERS {
        if let Some(value) = headers.get(name) {
            if let Ok(value) = value.to_str() {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Ok(trimmed.to_string());
                }
            }
        }
    }

    Err(ApiError::MissingIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_primary_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-User-ID", HeaderValue::from_static("uid-1"));
        assert_eq!(require_identity(&headers).unwrap(), "uid-1");
    }

    #[test]
    fn test_identity_compat_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-User-Identifier", HeaderValue::from_static("uid-2"));
        assert_eq!(require_identity(&headers).unwrap(), "uid-2");
    }

    #[test]
    fn test_identity_missing_is_client_error() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_identity(&headers),
            Err(ApiError::MissingIdentity)
        ));
    }

    #[test]
    fn test_identity_blank_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("X-User-ID", HeaderValue::from_static("   "));
        assert!(matches!(
            require_identity(&headers),
            Err(ApiError::MissingIdentity)
        ));
    }
}
