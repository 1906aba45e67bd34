//! Error types for the GitHub client.

use thiserror::Error;

/// Errors that can occur when talking to GitHub.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned 401; the stored credential is invalid or revoked.
    #[error("GitHub credential rejected (401)")]
    Unauthorized,

    /// Upstream returned a non-2xx response.
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// OAuth code exchange did not yield an access token.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl GitHubError {
    /// Whether this error indicates an unusable credential.
    pub fn is_credential_error(&self) -> bool {
        matches!(self, GitHubError::Unauthorized)
    }
}
