//! GitHub REST API client library.
//!
//! This crate provides a typed client for the handful of GitHub endpoints the
//! chat pipeline consumes: the authenticated user, repository listings and
//! details, commits, and issues, plus the OAuth authorization/exchange pair
//! used to connect an account.
//!
//! # Example
//!
//! ```no_run
//! use github_client::{GitHubClient, GitHubConfig};
//!
//! # async fn example() -> Result<(), github_client::GitHubError> {
//! let client = GitHubClient::new(GitHubConfig::from_env()?)?;
//!
//! let repos = client.list_repos("gho_token", 10).await?;
//! for repo in repos {
//!     println!("{} (updated {:?})", repo.full_name, repo.updated_at);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::GitHubClient;
pub use config::GitHubConfig;
pub use error::GitHubError;
pub use types::{
    GitHubCommit, GitHubIssue, GitHubRepo, GitHubUser, OAuthToken,
};
