//! Error types for integration lifecycle operations.

use database::DatabaseError;
use github_client::GitHubError;
use thiserror::Error;
use token_vault::VaultError;

/// Errors that can occur while managing integration connections.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Correlation token is unknown, already used, or expired.
    #[error("invalid or expired OAuth state")]
    InvalidState,

    /// The integration required by the operation is not connected.
    #[error("{0} integration not connected")]
    NotConnected(&'static str),

    /// User referenced by the operation does not exist.
    #[error("user not found: {0}")]
    UnknownUser(String),

    /// Upstream API failure.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// Token sealing failed.
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    /// Persistence failure.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
