//! GitHub adapter (REST v3).
//!
//! Endpoints used:
//!   * GET  /search/issues?q=is:pr ...
//!   * GET  /user
//!   * GET  /repos/{owner}/{repo}/pulls
//!   * GET  /repos/{owner}/{repo}/pulls/{number}           (+ diff media type)
//!   * POST /repos/{owner}/{repo}/pulls/{number}/comments  (inline)
//!   * POST /repos/{owner}/{repo}/issues/{number}/comments (general)

use crate::errors::{GitHostingError, GitHostingResult, ensure_success};
use crate::providers::types::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// GitHub HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_api: String, // "https://api.github.com"
    token: String,
}

impl GitHubClient {
    /// Constructs a GitHub client with a shared HTTP instance and auth token.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        debug!("Creating GitHubClient with base_api={}", base_api);
        Self {
            http,
            base_api,
            token,
        }
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.token)
    }

    /// Searches pull requests across GitHub via the issues search API.
    pub async fn search_prs(
        &self,
        query: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let url = format!("{}/search/issues", self.base_api);
        debug!("GitHub search_prs: query={}", query);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github.v3+json")
            .query(&[
                ("q", format!("is:pr {query} state:{state}")),
                ("per_page", limit.to_string()),
                ("sort", "updated".to_string()),
                ("order", "desc".to_string()),
            ])
            .send()
            .await?;

        let data: GitHubSearchResponse = ensure_success(resp).await?.json().await?;

        let mut results = Vec::with_capacity(data.items.len());
        for item in data.items {
            let (owner, repo) = split_repository_api_url(&item.repository_url)?;

            results.push(PullRequestSummary {
                id: item.number,
                title: item.title,
                state: item.state,
                url: item.html_url,
                repo_url: format!("https://github.com/{owner}/{repo}"),
                repo_owner: owner,
                repo_name: repo,
                created_at: item.created_at,
                updated_at: item.updated_at,
                author: item.user.login,
            });
        }

        Ok(results)
    }

    /// Lists PRs authored by `username`, resolving the authenticated login
    /// through `GET /user` when no username was given.
    pub async fn get_user_prs(
        &self,
        username: Option<&str>,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let login = match username {
            Some(name) => name.to_string(),
            None => {
                let url = format!("{}/user", self.base_api);
                debug!("GitHub get_user_prs: resolving authenticated user");

                let resp = self
                    .http
                    .get(&url)
                    .header("Authorization", self.auth_header())
                    .header("Accept", "application/vnd.github.v3+json")
                    .send()
                    .await?;

                let me: GitHubUser = ensure_success(resp).await?.json().await?;
                me.login
            }
        };

        self.search_prs(&format!("author:{login}"), state, limit)
            .await
    }

    /// Lists PRs of one repository.
    pub async fn get_repo_prs(
        &self,
        repo_url: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let (owner, repo) = parse_repo_url(repo_url)?;
        let url = format!("{}/repos/{}/{}/pulls", self.base_api, owner, repo);
        debug!("GitHub get_repo_prs: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github.v3+json")
            .query(&[
                ("state", state.to_string()),
                ("per_page", limit.to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
            ])
            .send()
            .await?;

        let prs: Vec<GitHubPr> = ensure_success(resp).await?.json().await?;

        let results = prs
            .into_iter()
            .map(|pr| PullRequestSummary {
                id: pr.number,
                title: pr.title,
                state: pr.state,
                url: pr.html_url,
                repo_owner: owner.clone(),
                repo_name: repo.clone(),
                repo_url: format!("https://github.com/{owner}/{repo}"),
                created_at: pr.created_at,
                updated_at: pr.updated_at,
                author: pr.user.login,
            })
            .collect();

        Ok(results)
    }

    /// Fetches the raw PR object, returned verbatim.
    pub async fn get_pr_details(
        &self,
        repo_url: &str,
        pr_id: u64,
    ) -> GitHostingResult<PullRequestDetails> {
        let (owner, repo) = parse_repo_url(repo_url)?;
        let url = format!("{}/repos/{}/{}/pulls/{}", self.base_api, owner, repo, pr_id);
        debug!("GitHub get_pr_details: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }

    /// Fetches the PR diff through GitHub's diff media type.
    pub async fn get_diff(&self, repo_url: &str, pr_id: u64) -> GitHostingResult<UnifiedDiff> {
        let (owner, repo) = parse_repo_url(repo_url)?;
        let url = format!("{}/repos/{}/{}/pulls/{}", self.base_api, owner, repo, pr_id);
        debug!("GitHub get_diff: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github.v3.diff")
            .send()
            .await?;

        Ok(ensure_success(resp).await?.text().await?)
    }

    /// Posts a review comment (inline when `path` + `line` are given) or a
    /// general issue comment otherwise.
    pub async fn post_comment(
        &self,
        repo_url: &str,
        pr_id: u64,
        comment: &str,
        path: Option<&str>,
        line: Option<u64>,
    ) -> GitHostingResult<serde_json::Value> {
        let (owner, repo) = parse_repo_url(repo_url)?;

        let (url, payload) = match (path, line) {
            (Some(path), Some(line)) => (
                format!(
                    "{}/repos/{}/{}/pulls/{}/comments",
                    self.base_api, owner, repo, pr_id
                ),
                json!({
                    "body": comment,
                    "path": path,
                    "line": line,
                    "side": "RIGHT",
                }),
            ),
            _ => (
                format!(
                    "{}/repos/{}/{}/issues/{}/comments",
                    self.base_api, owner, repo, pr_id
                ),
                json!({ "body": comment }),
            ),
        };

        debug!("GitHub post_comment: {}", url);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/vnd.github.v3+json")
            .json(&payload)
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }
}

/// Parses `https://github.com/owner/repo[.git][/]` into `(owner, repo)`.
pub(crate) fn parse_repo_url(repo_url: &str) -> GitHostingResult<(String, String)> {
    let trimmed = repo_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let mut parts = trimmed.rsplit('/');
    let repo = parts.next().filter(|s| !s.is_empty());
    let owner = parts.next().filter(|s| !s.is_empty());

    match (owner, repo) {
        (Some(owner), Some(repo)) => Ok((owner.to_string(), repo.to_string())),
        _ => Err(GitHostingError::Validation(format!(
            "cannot parse owner/repo from url: {repo_url}"
        ))),
    }
}

/// Recovers `(owner, repo)` from a search item's `repository_url`, e.g.
/// `https://api.github.com/repos/acme/widgets`.
fn split_repository_api_url(repository_url: &str) -> GitHostingResult<(String, String)> {
    let path = repository_url.split("/repos/").nth(1).ok_or_else(|| {
        GitHostingError::Validation(format!("unexpected repository_url: {repository_url}"))
    })?;

    parse_repo_url(path)
}

/// GitHub search response (subset).
#[derive(Debug, Deserialize)]
struct GitHubSearchResponse {
    #[serde(default)]
    items: Vec<GitHubSearchItem>,
}

#[derive(Debug, Deserialize)]
struct GitHubSearchItem {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    repository_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user: GitHubUser,
}

/// GitHub PR response (subset).
#[derive(Debug, Deserialize)]
struct GitHubPr {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user: GitHubUser,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repo_url_with_git_suffix() {
        let (owner, repo) = parse_repo_url("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "widgets");
    }

    #[test]
    fn parses_repo_url_with_trailing_slash() {
        let (owner, repo) = parse_repo_url("https://github.com/acme/widgets/").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "widgets");
    }

    #[test]
    fn parses_plain_repo_url() {
        let (owner, repo) = parse_repo_url("https://github.com/acme/widgets").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "widgets");
    }

    #[test]
    fn rejects_url_without_repo_segment() {
        assert!(parse_repo_url("https://").is_err());
    }

    #[test]
    fn splits_search_item_repository_url() {
        let (owner, repo) =
            split_repository_api_url("https://api.github.com/repos/acme/widgets").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "widgets");
    }
}
