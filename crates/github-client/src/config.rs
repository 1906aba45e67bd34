//! Configuration types for the GitHub client.

use std::env;

use crate::error::GitHubError;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default GitHub OAuth base URL.
pub const DEFAULT_OAUTH_BASE: &str = "https://github.com/login/oauth";

/// OAuth scopes requested when connecting an account.
pub const OAUTH_SCOPE: &str = "user:email,repo";

/// Configuration for the GitHub client.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// Redirect URI registered with the OAuth application.
    pub redirect_uri: String,
    /// REST API base URL (overridable for tests).
    pub api_base: String,
    /// OAuth base URL (overridable for tests).
    pub oauth_base: String,
}

impl GitHubConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GITHUB_CLIENT_ID` | OAuth client id | (required) |
    /// | `GITHUB_CLIENT_SECRET` | OAuth client secret | (required) |
    /// | `GITHUB_REDIRECT_URI` | OAuth redirect URI | `http://localhost:5173/integrations` |
    pub fn from_env() -> Result<Self, GitHubError> {
        let client_id = env::var("GITHUB_CLIENT_ID")
            .map_err(|_| GitHubError::Configuration("GITHUB_CLIENT_ID not set".to_string()))?;

        let client_secret = env::var("GITHUB_CLIENT_SECRET")
            .map_err(|_| GitHubError::Configuration("GITHUB_CLIENT_SECRET not set".to_string()))?;

        let redirect_uri = env::var("GITHUB_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:5173/integrations".to_string());

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            api_base: DEFAULT_API_BASE.to_string(),
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
        })
    }

    /// Create a new configuration with explicit OAuth credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
        }
    }

    /// Override the REST API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Override the OAuth base URL.
    pub fn with_oauth_base(mut self, base: impl Into<String>) -> Self {
        self.oauth_base = base.into();
        self
    }

    /// The authorization URL a user is redirected to, carrying the
    /// single-use correlation token as `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&scope={}&state={}",
            self.oauth_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(state),
        )
    }

    /// The token exchange endpoint URL.
    pub fn token_url(&self) -> String {
        format!("{}/access_token", self.oauth_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_state() {
        let config = GitHubConfig::new("cid", "secret", "http://localhost:5173/integrations");
        let url = config.authorize_url("tok123");

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("state=tok123"));
        assert!(url.contains("scope=user%3Aemail%2Crepo"));
    }

    #[test]
    fn test_base_overrides() {
        let config = GitHubConfig::new("cid", "secret", "http://cb")
            .with_api_base("http://127.0.0.1:9999")
            .with_oauth_base("http://127.0.0.1:9999/oauth");

        assert_eq!(config.api_base, "http://127.0.0.1:9999");
        assert_eq!(config.token_url(), "http://127.0.0.1:9999/oauth/access_token");
    }
}
