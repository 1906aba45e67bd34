//! GitHub REST and OAuth HTTP client.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::GitHubConfig;
use crate::error::GitHubError;
use crate::types::{
    GitHubCommit, GitHubIssue, GitHubRepo, GitHubUser, OAuthErrorBody, OAuthToken,
};

/// Client for the GitHub REST API and OAuth web flow.
///
/// Holds a single pooled HTTP client; per-user bearer tokens are supplied on
/// each call. No retries are performed here — retry policy, if any, belongs
/// to the caller.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Create a client with the given configuration.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        // GitHub rejects requests without a User-Agent.
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("prism-backend/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, GitHubError> {
        Self::new(GitHubConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// The authorization URL for starting the OAuth flow.
    pub fn authorize_url(&self, state: &str) -> String {
        self.config.authorize_url(state)
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthToken, GitHubError> {
        let response = self
            .http
            .post(self.config.token_url())
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::TokenExchange(format!(
                "exchange returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        // GitHub reports exchange failures as 200 with an error body.
        let body = response.text().await?;
        if let Ok(err) = serde_json::from_str::<OAuthErrorBody>(&body) {
            warn!(error = %err.error, "OAuth code exchange rejected");
            return Err(GitHubError::TokenExchange(
                err.error_description.unwrap_or(err.error),
            ));
        }

        serde_json::from_str::<OAuthToken>(&body)
            .map_err(|_| GitHubError::TokenExchange("no access token in response".to_string()))
    }

    /// Get the authenticated user. This is the lightweight call used to
    /// verify that a stored credential is still usable.
    pub async fn current_user(&self, token: &str) -> Result<GitHubUser, GitHubError> {
        self.get_json(token, &format!("{}/user", self.config.api_base), &[])
            .await
    }

    /// List the user's repositories, most recently updated first.
    pub async fn list_repos(
        &self,
        token: &str,
        limit: usize,
    ) -> Result<Vec<GitHubRepo>, GitHubError> {
        let url = format!("{}/user/repos", self.config.api_base);
        self.get_json(
            token,
            &url,
            &[("sort", "updated"), ("per_page", &limit.to_string())],
        )
        .await
    }

    /// Get details for one repository.
    pub async fn repo_details(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<GitHubRepo, GitHubError> {
        let url = format!("{}/repos/{}/{}", self.config.api_base, owner, repo);
        self.get_json(token, &url, &[]).await
    }

    /// List recent commits for a repository.
    pub async fn list_commits(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        let url = format!("{}/repos/{}/{}/commits", self.config.api_base, owner, repo);
        self.get_json(token, &url, &[("per_page", &limit.to_string())])
            .await
    }

    /// List issues for a repository, open and closed.
    pub async fn list_issues(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<GitHubIssue>, GitHubError> {
        let url = format!("{}/repos/{}/{}/issues", self.config.api_base, owner, repo);
        self.get_json(
            token,
            &url,
            &[("state", "all"), ("per_page", &limit.to_string())],
        )
        .await
    }

    /// Get details for one issue.
    pub async fn issue_details(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<GitHubIssue, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.config.api_base, owner, repo, number
        );
        self.get_json(token, &url, &[]).await
    }

    /// Issue an authenticated GET and decode the JSON response.
    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GitHubError> {
        debug!(%url, "GitHub API request");

        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .query(query)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Map non-success statuses to typed errors, keeping 401 distinguishable
    /// so callers can deactivate the stored credential.
    async fn check_status(response: Response) -> Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(GitHubError::Unauthorized);
        }

        let message = response.text().await.unwrap_or_default();
        let message = extract_api_message(&message);
        warn!(status = status.as_u16(), %message, "GitHub API error");

        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull the `message` field out of a GitHub error body, falling back to the
/// raw text when the body is not the usual JSON shape.
fn extract_api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_message_json() {
        let body = r#"{"message": "Bad credentials", "documentation_url": "..."}"#;
        assert_eq!(extract_api_message(body), "Bad credentials");
    }

    #[test]
    fn test_extract_api_message_plain() {
        assert_eq!(extract_api_message("  nope \n"), "nope");
    }

    #[test]
    fn test_credential_error_detection() {
        assert!(GitHubError::Unauthorized.is_credential_error());
        assert!(!GitHubError::Api {
            status: 404,
            message: "Not Found".to_string()
        }
        .is_credential_error());
    }
}
