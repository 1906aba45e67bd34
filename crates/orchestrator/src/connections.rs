//! Integration connection lifecycle.
//!
//! Owns the OAuth handshake state, the best-effort credential cache, and the
//! connect / callback / disconnect / status flows for GitHub. Credential
//! problems (decrypt failure, 401 from upstream) are recovered locally by
//! deactivating the stored integration and reporting "not connected" — they
//! never surface as failures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use database::{integration, user, Database, DatabaseError, User};
use github_client::GitHubClient;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use token_vault::TokenVault;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ConnectionError;
use crate::oauth_states::{HandshakeStore, PendingHandshake};

/// Integration type tag for GitHub.
pub const GITHUB: &str = "github";

/// Length of the correlation token minted for each handshake.
const STATE_TOKEN_LEN: usize = 32;

/// Connection status of one integration type, as reported to the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationStatus {
    pub integration_type: String,
    pub is_connected: bool,
    pub connected_at: Option<DateTime<Utc>>,
    pub integration_username: Option<String>,
}

impl IntegrationStatus {
    fn disconnected(integration_type: &str) -> Self {
        Self {
            integration_type: integration_type.to_string(),
            is_connected: false,
            connected_at: None,
            integration_username: None,
        }
    }
}

/// On-demand GitHub data requests. The tag set is closed; unknown tags are
/// rejected at deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "query_type", rename_all = "snake_case")]
pub enum GitHubQuery {
    Repos {
        #[serde(default = "default_query_limit")]
        limit: usize,
    },
    RepoDetails {
        owner: String,
        repo: String,
    },
    Commits {
        owner: String,
        repo: String,
        #[serde(default = "default_query_limit")]
        limit: usize,
    },
    Issues {
        owner: String,
        repo: String,
        #[serde(default = "default_query_limit")]
        limit: usize,
    },
    IssueDetails {
        owner: String,
        repo: String,
        issue_number: i64,
    },
}

fn default_query_limit() -> usize {
    10
}

/// Manages integration connections for all users.
pub struct IntegrationManager {
    db: Database,
    vault: TokenVault,
    github: GitHubClient,
    frontend_url: String,
    handshakes: HandshakeStore,
    /// Best-effort cache of decrypted tokens keyed by user row id.
    tokens: RwLock<HashMap<i64, String>>,
}

impl IntegrationManager {
    /// Create a manager over the given collaborators.
    pub fn new(
        db: Database,
        vault: TokenVault,
        github: GitHubClient,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            vault,
            github,
            frontend_url: frontend_url.into(),
            handshakes: HandshakeStore::new(),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// The GitHub client, shared with the context retriever.
    pub fn github(&self) -> &GitHubClient {
        &self.github
    }

    /// Begin the OAuth flow: mint a single-use correlation token and return
    /// the authorization URL to redirect the user to.
    pub async fn connect(&self, user_identifier: &str) -> Result<String, ConnectionError> {
        let user = user::get_or_create_user(self.db.pool(), user_identifier).await?;

        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_TOKEN_LEN)
            .map(char::from)
            .collect();

        self.handshakes
            .insert(
                state.clone(),
                PendingHandshake {
                    user_id: user.id,
                    integration_type: GITHUB.to_string(),
                },
            )
            .await;

        info!(user_id = user.id, "Issued GitHub OAuth state");
        Ok(self.github.authorize_url(&state))
    }

    /// Complete the OAuth flow: consume the correlation token, exchange the
    /// code, capture the remote identity, and store sealed credentials.
    /// Returns the frontend URL to redirect to.
    pub async fn callback(&self, code: &str, state: &str) -> Result<String, ConnectionError> {
        let pending = self
            .handshakes
            .take(state)
            .await
            .ok_or(ConnectionError::InvalidState)?;

        let token = self.github.exchange_code(code).await?;
        let identity = self.github.current_user(&token.access_token).await?;

        let sealed_access = self.vault.encrypt(&token.access_token)?;
        let sealed_refresh = token
            .refresh_token
            .as_deref()
            .map(|t| self.vault.encrypt(t))
            .transpose()?;

        let remote_account_id = identity.id.to_string();
        let params = integration::IntegrationUpsert {
            user_id: pending.user_id,
            integration_type: &pending.integration_type,
            access_token: &sealed_access,
            refresh_token: sealed_refresh.as_deref(),
            integration_user_id: &remote_account_id,
            integration_username: &identity.login,
            metadata: serde_json::json!({
                "name": identity.name,
                "email": identity.email,
                "avatar_url": identity.avatar_url,
            }),
        };
        integration::upsert_integration(self.db.pool(), &params).await?;

        // Prime the cache so the first status check after connecting does
        // not need a decrypt round-trip.
        self.tokens
            .write()
            .await
            .insert(pending.user_id, token.access_token);

        info!(
            user_id = pending.user_id,
            username = %identity.login,
            "GitHub integration connected"
        );

        Ok(format!("{}/integrations?success=github", self.frontend_url))
    }

    /// Look up an existing user, distinguishing "unknown" from a real
    /// persistence failure.
    async fn resolve_user(&self, user_identifier: &str) -> Result<User, ConnectionError> {
        match user::get_user_by_identifier(self.db.pool(), user_identifier).await {
            Ok(user) => Ok(user),
            Err(DatabaseError::NotFound { .. }) => {
                Err(ConnectionError::UnknownUser(user_identifier.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Disconnect GitHub: deactivate the stored row and drop the cached
    /// credential. The row is kept so a reconnect can reuse it.
    pub async fn disconnect(&self, user_identifier: &str) -> Result<(), ConnectionError> {
        let user = self.resolve_user(user_identifier).await?;

        integration::deactivate_integration(self.db.pool(), user.id, GITHUB).await?;
        self.tokens.write().await.remove(&user.id);

        info!(user_id = user.id, "GitHub integration disconnected");
        Ok(())
    }

    /// Report connection status for every known integration type.
    ///
    /// The status is verified with one lightweight authenticated call; an
    /// unusable credential is deactivated and reported as disconnected
    /// rather than raised.
    pub async fn status(&self, user_identifier: &str) -> Result<Vec<IntegrationStatus>, ConnectionError> {
        let user = user::get_or_create_user(self.db.pool(), user_identifier).await?;

        let status = match self.access_token(user.id).await? {
            Some(token) => match self.github.current_user(&token).await {
                Ok(identity) => {
                    let row = integration::get_active_integration(self.db.pool(), user.id, GITHUB)
                        .await?;
                    IntegrationStatus {
                        integration_type: GITHUB.to_string(),
                        is_connected: true,
                        connected_at: row.map(|r| r.connected_at),
                        integration_username: Some(identity.login),
                    }
                }
                Err(e) if e.is_credential_error() => {
                    warn!(user_id = user.id, "GitHub credential rejected, deactivating");
                    self.invalidate(user.id).await?;
                    IntegrationStatus::disconnected(GITHUB)
                }
                Err(e) => {
                    warn!(user_id = user.id, "GitHub status check failed: {}", e);
                    IntegrationStatus::disconnected(GITHUB)
                }
            },
            None => IntegrationStatus::disconnected(GITHUB),
        };

        Ok(vec![status])
    }

    /// The remote identity of the connected GitHub account.
    pub async fn github_identity(
        &self,
        user_identifier: &str,
    ) -> Result<github_client::GitHubUser, ConnectionError> {
        let user = self.resolve_user(user_identifier).await?;

        let token = self
            .access_token(user.id)
            .await?
            .ok_or(ConnectionError::NotConnected(GITHUB))?;

        match self.github.current_user(&token).await {
            Ok(identity) => Ok(identity),
            Err(e) if e.is_credential_error() => {
                self.invalidate(user.id).await?;
                Err(ConnectionError::NotConnected(GITHUB))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run an on-demand GitHub query on behalf of a user.
    pub async fn query(
        &self,
        user_identifier: &str,
        query: GitHubQuery,
    ) -> Result<serde_json::Value, ConnectionError> {
        let user = self.resolve_user(user_identifier).await?;

        let token = self
            .access_token(user.id)
            .await?
            .ok_or(ConnectionError::NotConnected(GITHUB))?;

        let result = self.run_query(&token, query).await;
        match result {
            Err(ConnectionError::GitHub(ref e)) if e.is_credential_error() => {
                self.invalidate(user.id).await?;
                Err(ConnectionError::NotConnected(GITHUB))
            }
            other => other,
        }
    }

    async fn run_query(
        &self,
        token: &str,
        query: GitHubQuery,
    ) -> Result<serde_json::Value, ConnectionError> {
        let value = match query {
            GitHubQuery::Repos { limit } => {
                serde_json::to_value(self.github.list_repos(token, limit).await?)
            }
            GitHubQuery::RepoDetails { owner, repo } => {
                serde_json::to_value(self.github.repo_details(token, &owner, &repo).await?)
            }
            GitHubQuery::Commits { owner, repo, limit } => serde_json::to_value(
                self.github.list_commits(token, &owner, &repo, limit).await?,
            ),
            GitHubQuery::Issues { owner, repo, limit } => serde_json::to_value(
                self.github.list_issues(token, &owner, &repo, limit).await?,
            ),
            GitHubQuery::IssueDetails {
                owner,
                repo,
                issue_number,
            } => serde_json::to_value(
                self.github
                    .issue_details(token, &owner, &repo, issue_number)
                    .await?,
            ),
        };

        // Serializing our own response types cannot realistically fail.
        Ok(value.unwrap_or(serde_json::Value::Null))
    }

    /// Resolve a usable access token for a user, or `None` when no active
    /// integration exists. A credential that fails to decrypt deactivates
    /// the integration (it can never become usable again).
    pub async fn access_token(&self, user_id: i64) -> Result<Option<String>, ConnectionError> {
        if let Some(token) = self.tokens.read().await.get(&user_id) {
            return Ok(Some(token.clone()));
        }

        let Some(row) =
            integration::get_active_integration(self.db.pool(), user_id, GITHUB).await?
        else {
            return Ok(None);
        };

        match self.vault.decrypt(&row.access_token) {
            Ok(token) => {
                self.tokens.write().await.insert(user_id, token.clone());
                Ok(Some(token))
            }
            Err(e) => {
                warn!(user_id, "Stored GitHub token unusable ({}), deactivating", e);
                self.invalidate(user_id).await?;
                Ok(None)
            }
        }
    }

    /// Deactivate the stored integration and drop the cached token.
    async fn invalidate(&self, user_id: i64) -> Result<(), ConnectionError> {
        integration::deactivate_integration(self.db.pool(), user_id, GITHUB).await?;
        self.tokens.write().await.remove(&user_id);
        Ok(())
    }

    /// Drop expired handshakes. Called periodically from the API binary.
    pub async fn sweep_handshakes(&self) -> usize {
        self.handshakes.sweep_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_tag_parsing() {
        let query: GitHubQuery = serde_json::from_value(serde_json::json!({
            "query_type": "commits",
            "owner": "octocat",
            "repo": "widget"
        }))
        .unwrap();

        match query {
            GitHubQuery::Commits { owner, repo, limit } => {
                assert_eq!(owner, "octocat");
                assert_eq!(repo, "widget");
                assert_eq!(limit, 10);
            }
            other => panic!("unexpected query: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_query_tag_rejected() {
        let result: Result<GitHubQuery, _> = serde_json::from_value(serde_json::json!({
            "query_type": "pull_requests",
            "owner": "octocat",
            "repo": "widget"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_query_missing_fields_rejected() {
        let result: Result<GitHubQuery, _> = serde_json::from_value(serde_json::json!({
            "query_type": "repo_details",
            "owner": "octocat"
        }));

        assert!(result.is_err());
    }
}
