//! Conditional GitHub augmentation for the context retriever.
//!
//! When a prompt mentions repository activity, the retriever pulls a digest
//! of the user's recent GitHub data and appends it to the assembled context
//! as authorized external data.

use github_client::{GitHubClient, GitHubCommit, GitHubError, GitHubIssue, GitHubRepo};
use tracing::debug;

/// Terms that flag a prompt as asking about repository activity.
/// Matched case-insensitively as substrings.
const TRIGGER_TERMS: &[&str] = &[
    "github",
    "repository",
    "repositories",
    "repo",
    "commit",
    "issue",
    "pull request",
    "code",
    "branch",
];

/// How many of the user's most recent repositories are scanned for a match.
const REPO_SCAN_LIMIT: usize = 10;

/// At most this many prompt-matched repositories are expanded in full.
const MATCHED_REPO_CAP: usize = 2;

/// Commits fetched per expanded repository.
const COMMITS_PER_REPO: usize = 5;

/// Issues fetched per expanded repository.
const ISSUES_PER_REPO: usize = 5;

/// Whether the prompt asks about repository activity.
pub fn mentions_github(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    TRIGGER_TERMS.iter().any(|term| lower.contains(term))
}

/// Repositories whose name or full name appears in the prompt, capped.
pub fn match_repos<'a>(prompt: &str, repos: &'a [GitHubRepo]) -> Vec<&'a GitHubRepo> {
    let lower = prompt.to_lowercase();
    repos
        .iter()
        .filter(|repo| {
            lower.contains(&repo.name.to_lowercase())
                || lower.contains(&repo.full_name.to_lowercase())
        })
        .take(MATCHED_REPO_CAP)
        .collect()
}

/// Build the external-data digest for a triggered prompt.
///
/// Repositories named in the prompt are expanded with details, commits, and
/// issues; when none are named, the single most recently updated repository
/// is expanded with details and commits. Errors propagate so the caller can
/// degrade to an explanatory note.
pub async fn build_digest(
    github: &GitHubClient,
    token: &str,
    prompt: &str,
) -> Result<String, GitHubError> {
    let repos = github.list_repos(token, REPO_SCAN_LIMIT).await?;
    if repos.is_empty() {
        return Ok(String::new());
    }

    let matched = match_repos(prompt, &repos);
    let mut sections = Vec::new();

    if matched.is_empty() {
        // No repository named; summarize the most recently updated one.
        let repo = &repos[0];
        let (owner, name) = repo.owner_and_name();
        let detail = github.repo_details(token, owner, name).await?;
        let commits = github.list_commits(token, owner, name, COMMITS_PER_REPO).await?;
        sections.push(format_repo_digest(&detail, &commits, None));
    } else {
        debug!(count = matched.len(), "Expanding repositories named in prompt");
        for repo in matched {
            let (owner, name) = repo.owner_and_name();
            let detail = github.repo_details(token, owner, name).await?;
            let commits = github.list_commits(token, owner, name, COMMITS_PER_REPO).await?;
            let issues = github.list_issues(token, owner, name, ISSUES_PER_REPO).await?;
            sections.push(format_repo_digest(&detail, &commits, Some(&issues)));
        }
    }

    Ok(sections.join("\n\n"))
}

/// Render one repository's digest block.
pub fn format_repo_digest(
    repo: &GitHubRepo,
    commits: &[GitHubCommit],
    issues: Option<&[GitHubIssue]>,
) -> String {
    let mut out = format!("Repository: {}", repo.full_name);

    if let Some(description) = repo.description.as_deref() {
        out.push_str(&format!("\nDescription: {}", description));
    }
    if let Some(language) = repo.language.as_deref() {
        out.push_str(&format!("\nLanguage: {}", language));
    }
    out.push_str(&format!(
        "\nStars: {} | Forks: {} | Open issues: {}",
        repo.stargazers_count, repo.forks_count, repo.open_issues_count
    ));
    if let Some(updated) = repo.updated_at.as_deref() {
        out.push_str(&format!("\nLast updated: {}", updated));
    }

    if !commits.is_empty() {
        out.push_str("\nRecent commits:");
        for commit in commits {
            let summary = commit.commit.message.lines().next().unwrap_or_default();
            let author = commit
                .commit
                .author
                .as_ref()
                .and_then(|a| a.name.as_deref())
                .unwrap_or("unknown");
            out.push_str(&format!("\n- {} ({})", summary, author));
        }
    }

    if let Some(issues) = issues {
        if !issues.is_empty() {
            out.push_str("\nIssues:");
            for issue in issues {
                out.push_str(&format!(
                    "\n- #{} [{}] {}",
                    issue.number, issue.state, issue.title
                ));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, full_name: &str) -> GitHubRepo {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "full_name": full_name,
            "html_url": format!("https://github.com/{}", full_name),
            "description": "test repo",
            "language": "Rust",
            "stargazers_count": 3,
            "updated_at": "2026-08-01T00:00:00Z"
        }))
        .unwrap()
    }

    fn commit(message: &str, author: &str) -> GitHubCommit {
        serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "html_url": "https://example.invalid",
            "commit": { "message": message, "author": { "name": author } }
        }))
        .unwrap()
    }

    #[test]
    fn test_trigger_terms_case_insensitive() {
        assert!(mentions_github("What's new in my REPO?"));
        assert!(mentions_github("any open issues today?"));
        assert!(mentions_github("show me the latest commit"));
        assert!(!mentions_github("how is the weather?"));
    }

    #[test]
    fn test_match_repos_by_name_substring() {
        let repos = vec![repo("widget", "octocat/widget"), repo("gadget", "octocat/gadget")];
        let matched = match_repos("is there activity in widget lately?", &repos);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "widget");
    }

    #[test]
    fn test_match_repos_caps_expansion() {
        let repos = vec![
            repo("alpha", "o/alpha"),
            repo("beta", "o/beta"),
            repo("gamma", "o/gamma"),
        ];
        let matched = match_repos("compare alpha, beta and gamma", &repos);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_match_repos_none() {
        let repos = vec![repo("widget", "octocat/widget")];
        assert!(match_repos("what changed recently?", &repos).is_empty());
    }

    #[test]
    fn test_digest_contains_commit_messages_and_authors() {
        let detail = repo("widget", "octocat/widget");
        let commits = vec![
            commit("fix: handle empty input\n\nlonger body", "Octo Cat"),
            commit("feat: add retry", "Hubot"),
        ];

        let digest = format_repo_digest(&detail, &commits, None);

        assert!(digest.starts_with("Repository: octocat/widget"));
        assert!(digest.contains("- fix: handle empty input (Octo Cat)"));
        assert!(digest.contains("- feat: add retry (Hubot)"));
        // Only the first line of a commit message appears.
        assert!(!digest.contains("longer body"));
    }

    #[test]
    fn test_digest_lists_issues_when_present() {
        let detail = repo("widget", "octocat/widget");
        let issues: Vec<GitHubIssue> = vec![serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Crash on start",
            "state": "open",
            "html_url": "https://example.invalid",
            "created_at": "2026-07-01T00:00:00Z",
            "updated_at": "2026-07-02T00:00:00Z"
        }))
        .unwrap()];

        let digest = format_repo_digest(&detail, &[], Some(&issues));
        assert!(digest.contains("- #7 [open] Crash on start"));
    }
}
