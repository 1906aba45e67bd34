//! GitHub API response types.
//!
//! Only the fields the pipeline actually reads are modeled; everything else
//! in the upstream payloads is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// The authenticated GitHub account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    /// Numeric account id.
    pub id: i64,
    /// Account login name.
    pub login: String,
    /// Display name, if set.
    pub name: Option<String>,
    /// Public email, if set.
    pub email: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

/// A repository summary or detail record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub open_issues_count: i64,
}

impl GitHubRepo {
    /// Split `full_name` into `(owner, repo)`.
    ///
    /// Falls back to an empty owner when the full name carries no slash,
    /// which upstream never produces for a real repository.
    pub fn owner_and_name(&self) -> (&str, &str) {
        match self.full_name.split_once('/') {
            Some((owner, name)) => (owner, name),
            None => ("", self.name.as_str()),
        }
    }
}

/// A commit listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub commit: CommitDetail,
    pub html_url: String,
}

/// The nested `commit` object carrying message and author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

/// Commit author attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// An issue listing or detail record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub number: i64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<IssueUser>,
    #[serde(default)]
    pub labels: Vec<IssueLabel>,
}

/// The user who opened an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueUser {
    pub login: String,
}

/// An issue label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueLabel {
    pub name: String,
}

/// A successful OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error payload GitHub returns on a failed exchange (HTTP 200 with an
/// `error` field, per the OAuth web flow).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_owner_and_name() {
        let repo: GitHubRepo = serde_json::from_value(serde_json::json!({
            "name": "widget",
            "full_name": "octocat/widget",
            "html_url": "https://github.com/octocat/widget"
        }))
        .unwrap();

        assert_eq!(repo.owner_and_name(), ("octocat", "widget"));
        assert_eq!(repo.stargazers_count, 0);
    }

    #[test]
    fn test_commit_deserializes_author() {
        let commit: GitHubCommit = serde_json::from_value(serde_json::json!({
            "sha": "abc123",
            "html_url": "https://github.com/octocat/widget/commit/abc123",
            "commit": {
                "message": "fix: handle empty input",
                "author": { "name": "Octo Cat", "date": "2026-08-01T12:00:00Z" }
            }
        }))
        .unwrap();

        assert_eq!(commit.commit.message, "fix: handle empty input");
        assert_eq!(
            commit.commit.author.unwrap().name.as_deref(),
            Some("Octo Cat")
        );
    }

    #[test]
    fn test_issue_tolerates_missing_optionals() {
        let issue: GitHubIssue = serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Crash on start",
            "state": "open",
            "html_url": "https://github.com/octocat/widget/issues/7",
            "created_at": "2026-07-01T00:00:00Z",
            "updated_at": "2026-07-02T00:00:00Z"
        }))
        .unwrap();

        assert!(issue.user.is_none());
        assert!(issue.labels.is_empty());
    }

    #[test]
    fn test_oauth_token_minimal() {
        let token: OAuthToken =
            serde_json::from_value(serde_json::json!({ "access_token": "gho_x" })).unwrap();
        assert_eq!(token.access_token, "gho_x");
        assert!(token.refresh_token.is_none());
    }
}
