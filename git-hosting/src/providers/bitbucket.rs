//! Bitbucket Cloud adapter (REST 2.0).
//!
//! Endpoints used:
//!   * GET  /pullrequests                       (workspace-wide query search)
//!   * GET  /pullrequests/{username}
//!   * GET  /user
//!   * GET  /repositories/{ws}/{slug}/pullrequests
//!   * GET  /repositories/{ws}/{slug}/pullrequests/{id}
//!   * GET  /repositories/{ws}/{slug}/pullrequests/{id}/diff
//!   * POST /repositories/{ws}/{slug}/pullrequests/{id}/comments

use crate::errors::{GitHostingError, GitHostingResult, ensure_success};
use crate::providers::types::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Bitbucket HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: Client,
    base_api: String, // "https://api.bitbucket.org/2.0"
    token: String,    // bearer token
}

impl BitbucketClient {
    /// Constructs a Bitbucket client with a shared HTTP instance and token.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        debug!("Creating BitbucketClient with base_api={}", base_api);
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Searches pull requests with Bitbucket's query language.
    pub async fn search_prs(
        &self,
        query: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let url = format!("{}/pullrequests", self.base_api);
        debug!("Bitbucket search_prs: query={}", query);

        let q = format!(r#"state = "{state}" AND (title ~ "{query}" OR description ~ "{query}")"#);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[
                ("q", q),
                ("pagelen", limit.to_string()),
                ("sort", "-updated_on".to_string()),
            ])
            .send()
            .await?;

        let page: BitbucketPage = ensure_success(resp).await?.json().await?;
        Ok(page.values.into_iter().map(summarize).collect())
    }

    /// Lists PRs authored by `username`, resolving the authenticated user
    /// through `GET /user` when no username was given.
    pub async fn get_user_prs(
        &self,
        username: Option<&str>,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let user = match username {
            Some(name) => name.to_string(),
            None => {
                let url = format!("{}/user", self.base_api);
                debug!("Bitbucket get_user_prs: resolving authenticated user");

                let resp = self
                    .http
                    .get(&url)
                    .bearer_auth(&self.token)
                    .header("Accept", "application/json")
                    .send()
                    .await?;

                let me: BitbucketUser = ensure_success(resp).await?.json().await?;
                me.username
            }
        };

        let url = format!("{}/pullrequests/{}", self.base_api, user);
        debug!("Bitbucket get_user_prs: {}", url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[
                ("state", state.to_string()),
                ("pagelen", limit.to_string()),
                ("sort", "-updated_on".to_string()),
            ])
            .send()
            .await?;

        let page: BitbucketPage = ensure_success(resp).await?.json().await?;
        Ok(page.values.into_iter().map(summarize).collect())
    }

    /// Lists PRs of one repository.
    pub async fn get_repo_prs(
        &self,
        repo_url: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        let (workspace, slug) = parse_repo_url(repo_url)?;
        let url = format!(
            "{}/repositories/{}/{}/pullrequests",
            self.base_api, workspace, slug
        );
        debug!("Bitbucket get_repo_prs: {}", url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[
                ("state", state.to_string()),
                ("pagelen", limit.to_string()),
                ("sort", "-updated_on".to_string()),
            ])
            .send()
            .await?;

        let page: BitbucketPage = ensure_success(resp).await?.json().await?;
        Ok(page.values.into_iter().map(summarize).collect())
    }

    /// Fetches the raw PR object, returned verbatim.
    pub async fn get_pr_details(
        &self,
        repo_url: &str,
        pr_id: u64,
    ) -> GitHostingResult<PullRequestDetails> {
        let (workspace, slug) = parse_repo_url(repo_url)?;
        let url = format!(
            "{}/repositories/{}/{}/pullrequests/{}",
            self.base_api, workspace, slug, pr_id
        );
        debug!("Bitbucket get_pr_details: {}", url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }

    /// Fetches the PR diff from Bitbucket's dedicated diff endpoint.
    pub async fn get_diff(&self, repo_url: &str, pr_id: u64) -> GitHostingResult<UnifiedDiff> {
        let (workspace, slug) = parse_repo_url(repo_url)?;
        let url = format!(
            "{}/repositories/{}/{}/pullrequests/{}/diff",
            self.base_api, workspace, slug, pr_id
        );
        debug!("Bitbucket get_diff: {}", url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(ensure_success(resp).await?.text().await?)
    }

    /// Posts a comment, inline (`inline.path` + `inline.to`) when a position
    /// was supplied.
    pub async fn post_comment(
        &self,
        repo_url: &str,
        pr_id: u64,
        comment: &str,
        path: Option<&str>,
        line: Option<u64>,
    ) -> GitHostingResult<serde_json::Value> {
        let (workspace, slug) = parse_repo_url(repo_url)?;
        let url = format!(
            "{}/repositories/{}/{}/pullrequests/{}/comments",
            self.base_api, workspace, slug, pr_id
        );

        let mut payload = json!({ "content": { "raw": comment } });
        if let (Some(path), Some(line)) = (path, line) {
            payload["inline"] = json!({ "path": path, "to": line });
        }

        debug!("Bitbucket post_comment: {}", url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        Ok(ensure_success(resp).await?.json().await?)
    }
}

/// Parses `https://bitbucket.org/workspace/repo[.git][/]` into
/// `(workspace, repo_slug)`.
pub(crate) fn parse_repo_url(repo_url: &str) -> GitHostingResult<(String, String)> {
    let trimmed = repo_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let mut parts = trimmed.rsplit('/');
    let slug = parts.next().filter(|s| !s.is_empty());
    let workspace = parts.next().filter(|s| !s.is_empty());

    match (workspace, slug) {
        (Some(workspace), Some(slug)) => Ok((workspace.to_string(), slug.to_string())),
        _ => Err(GitHostingError::Validation(format!(
            "cannot parse workspace/repo from url: {repo_url}"
        ))),
    }
}

fn summarize(pr: BitbucketPr) -> PullRequestSummary {
    let repo = pr.source.repository;
    let repo_owner = repo
        .full_name
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();

    PullRequestSummary {
        id: pr.id,
        title: pr.title,
        state: pr.state,
        url: pr.links.html.href,
        repo_owner,
        repo_name: repo.name,
        repo_url: repo.links.html.href,
        created_at: pr.created_on,
        updated_at: pr.updated_on,
        author: pr.author.display_name,
    }
}

/// Paged listing response (subset).
#[derive(Debug, Deserialize)]
struct BitbucketPage {
    #[serde(default)]
    values: Vec<BitbucketPr>,
}

#[derive(Debug, Deserialize)]
struct BitbucketPr {
    id: u64,
    title: String,
    state: String,
    links: BitbucketLinks,
    source: BitbucketSource,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
    author: BitbucketAuthor,
}

#[derive(Debug, Deserialize)]
struct BitbucketSource {
    repository: BitbucketRepository,
}

#[derive(Debug, Deserialize)]
struct BitbucketRepository {
    name: String,
    full_name: String,
    links: BitbucketLinks,
}

#[derive(Debug, Deserialize)]
struct BitbucketLinks {
    html: BitbucketHref,
}

#[derive(Debug, Deserialize)]
struct BitbucketHref {
    href: String,
}

#[derive(Debug, Deserialize)]
struct BitbucketAuthor {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct BitbucketUser {
    username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repo_url_variants() {
        for url in [
            "https://bitbucket.org/acme/widgets",
            "https://bitbucket.org/acme/widgets.git",
            "https://bitbucket.org/acme/widgets/",
        ] {
            let (workspace, slug) = parse_repo_url(url).unwrap();
            assert_eq!(workspace, "acme");
            assert_eq!(slug, "widgets");
        }
    }
}
