//! Provider facade without async-trait or dynamic trait objects.
//!
//! This module exposes an enum `ProviderClient` that wraps concrete
//! implementations for each git-hosting provider. The goal is a uniform,
//! provider-agnostic interface for:
//!   * searching and listing pull/merge requests
//!   * fetching PR details and unified diffs
//!   * posting general and inline comments back to the provider.

pub mod types;
pub use types::*;

pub mod azure_devops;
pub mod bitbucket;
pub mod github;
pub mod gitlab;

use crate::errors::{ConfigError, GitHostingResult};
use tracing::debug;

/// Runtime configuration for any provider client.
///
/// Credentials and base URL are supplied at construction and stay immutable
/// for the adapter's lifetime.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// API base, e.g. "https://api.github.com" or an Azure DevOps org URL.
    pub base_api: String,
    /// Access token for the provider (PAT or app token).
    pub token: String,
}

impl ProviderConfig {
    /// Builds a config from a token and an optional base URL override.
    ///
    /// Falls back to the provider's canonical cloud endpoint; Azure DevOps
    /// has none, so a missing org URL is a configuration error.
    pub fn new(
        kind: ProviderKind,
        token: String,
        base_api: Option<String>,
    ) -> GitHostingResult<Self> {
        if token.is_empty() {
            return Err(ConfigError::MissingToken(kind.label()).into());
        }

        let base_api = match base_api {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => kind
                .default_base_api()
                .ok_or(ConfigError::MissingBaseUrl(kind.label()))?
                .to_string(),
        };

        Ok(Self {
            kind,
            base_api,
            token,
        })
    }
}

/// Concrete provider client with enum dispatch.
///
/// This type is the single entry point for all git-hosting interactions.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    GitHub(github::GitHubClient),
    GitLab(gitlab::GitLabClient),
    Bitbucket(bitbucket::BitbucketClient),
    AzureDevOps(azure_devops::AzureDevOpsClient),
}

impl ProviderClient {
    /// Constructs a concrete provider client from generic configuration.
    ///
    /// The underlying HTTP client is shared and configured with a stable
    /// user agent so that providers can identify the integration.
    pub fn from_config(cfg: ProviderConfig) -> GitHostingResult<Self> {
        debug!(
            "Initializing provider client: kind={:?}, base_api={}",
            cfg.kind, cfg.base_api
        );

        let http = reqwest::Client::builder()
            .user_agent("pr-review-agent/0.1")
            .build()?;

        let client = match cfg.kind {
            ProviderKind::GitHub => {
                ProviderClient::GitHub(github::GitHubClient::new(http, cfg.base_api, cfg.token))
            }
            ProviderKind::GitLab => {
                ProviderClient::GitLab(gitlab::GitLabClient::new(http, cfg.base_api, cfg.token))
            }
            ProviderKind::Bitbucket => ProviderClient::Bitbucket(bitbucket::BitbucketClient::new(
                http,
                cfg.base_api,
                cfg.token,
            )),
            ProviderKind::AzureDevOps => ProviderClient::AzureDevOps(
                azure_devops::AzureDevOpsClient::new(http, cfg.base_api, cfg.token),
            ),
        };

        Ok(client)
    }

    /// Which provider this client talks to.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::GitHub(_) => ProviderKind::GitHub,
            Self::GitLab(_) => ProviderKind::GitLab,
            Self::Bitbucket(_) => ProviderKind::Bitbucket,
            Self::AzureDevOps(_) => ProviderKind::AzureDevOps,
        }
    }

    /// Text/metadata search scoped to a provider-native state string.
    pub async fn search_prs(
        &self,
        query: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        debug!("search_prs: provider={:?}, query={}", self.kind(), query);

        match self {
            Self::GitHub(c) => c.search_prs(query, state, limit).await,
            Self::GitLab(c) => c.search_prs(query, state, limit).await,
            Self::Bitbucket(c) => c.search_prs(query, state, limit).await,
            Self::AzureDevOps(c) => c.search_prs(query, state, limit).await,
        }
    }

    /// Lists PRs authored by `username`.
    ///
    /// When `username` is absent the authenticated identity is resolved
    /// first (one extra round trip, never cached across calls).
    pub async fn get_user_prs(
        &self,
        username: Option<&str>,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        debug!(
            "get_user_prs: provider={:?}, username={:?}",
            self.kind(),
            username
        );

        match self {
            Self::GitHub(c) => c.get_user_prs(username, state, limit).await,
            Self::GitLab(c) => c.get_user_prs(username, state, limit).await,
            Self::Bitbucket(c) => c.get_user_prs(username, state, limit).await,
            Self::AzureDevOps(c) => c.get_user_prs(username, state, limit).await,
        }
    }

    /// Lists PRs of one repository identified by its web URL.
    pub async fn get_repo_prs(
        &self,
        repo_url: &str,
        state: &str,
        limit: u32,
    ) -> GitHostingResult<Vec<PullRequestSummary>> {
        debug!(
            "get_repo_prs: provider={:?}, repo_url={}",
            self.kind(),
            repo_url
        );

        match self {
            Self::GitHub(c) => c.get_repo_prs(repo_url, state, limit).await,
            Self::GitLab(c) => c.get_repo_prs(repo_url, state, limit).await,
            Self::Bitbucket(c) => c.get_repo_prs(repo_url, state, limit).await,
            Self::AzureDevOps(c) => c.get_repo_prs(repo_url, state, limit).await,
        }
    }

    /// Fetches the provider's raw PR object, returned verbatim.
    pub async fn get_pr_details(
        &self,
        repo_url: &str,
        pr_id: u64,
    ) -> GitHostingResult<PullRequestDetails> {
        debug!(
            "get_pr_details: provider={:?}, repo_url={}, pr_id={}",
            self.kind(),
            repo_url,
            pr_id
        );

        match self {
            Self::GitHub(c) => c.get_pr_details(repo_url, pr_id).await,
            Self::GitLab(c) => c.get_pr_details(repo_url, pr_id).await,
            Self::Bitbucket(c) => c.get_pr_details(repo_url, pr_id).await,
            Self::AzureDevOps(c) => c.get_pr_details(repo_url, pr_id).await,
        }
    }

    /// Fetches the PR's changes as one unified-diff text blob.
    ///
    /// Providers without a direct diff endpoint (GitLab, Azure DevOps)
    /// synthesize the diff from per-file change objects.
    pub async fn get_diff(&self, repo_url: &str, pr_id: u64) -> GitHostingResult<UnifiedDiff> {
        debug!(
            "get_diff: provider={:?}, repo_url={}, pr_id={}",
            self.kind(),
            repo_url,
            pr_id
        );

        match self {
            Self::GitHub(c) => c.get_diff(repo_url, pr_id).await,
            Self::GitLab(c) => c.get_diff(repo_url, pr_id).await,
            Self::Bitbucket(c) => c.get_diff(repo_url, pr_id).await,
            Self::AzureDevOps(c) => c.get_diff(repo_url, pr_id).await,
        }
    }

    /// Posts a comment on the PR.
    ///
    /// When both `path` and `line` are present the comment is positioned
    /// inline; otherwise a general PR-level comment is created. Each
    /// provider resolves the position into its native payload shape.
    pub async fn post_comment(
        &self,
        repo_url: &str,
        pr_id: u64,
        comment: &str,
        path: Option<&str>,
        line: Option<u64>,
    ) -> GitHostingResult<serde_json::Value> {
        debug!(
            "post_comment: provider={:?}, repo_url={}, pr_id={}, inline={}",
            self.kind(),
            repo_url,
            pr_id,
            path.is_some() && line.is_some()
        );

        match self {
            Self::GitHub(c) => c.post_comment(repo_url, pr_id, comment, path, line).await,
            Self::GitLab(c) => c.post_comment(repo_url, pr_id, comment, path, line).await,
            Self::Bitbucket(c) => c.post_comment(repo_url, pr_id, comment, path, line).await,
            Self::AzureDevOps(c) => c.post_comment(repo_url, pr_id, comment, path, line).await,
        }
    }
}
