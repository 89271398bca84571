//! Shared state for all HTTP handlers.

use git_hosting::{GitHostingResult, ProviderClient, ProviderConfig, ProviderKind};
use review_engine::{CodeAnalyzer, ReviewAgent};

/// Per-provider credentials and URLs resolved once at startup.
///
/// A missing token leaves that provider unconfigured rather than failing
/// startup; requests against it are rejected with a config error.
#[derive(Clone, Default)]
pub struct AppState {
    pub github_token: Option<String>,
    pub gitlab_token: Option<String>,
    pub gitlab_url: Option<String>,
    pub bitbucket_token: Option<String>,
    pub azure_token: Option<String>,
    pub azure_org_url: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl AppState {
    /// Load shared state from environment variables.
    pub fn from_env() -> Self {
        Self {
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            gitlab_token: std::env::var("GITLAB_TOKEN").ok(),
            gitlab_url: std::env::var("GITLAB_URL").ok(),
            bitbucket_token: std::env::var("BITBUCKET_TOKEN").ok(),
            azure_token: std::env::var("AZURE_DEVOPS_TOKEN").ok(),
            azure_org_url: std::env::var("AZURE_DEVOPS_ORG_URL").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
        }
    }

    /// Whether the provider has a token configured.
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.token_for(kind).is_some()
    }

    /// URL shown in the servers listing.
    pub fn display_url(&self, kind: ProviderKind) -> String {
        match kind {
            ProviderKind::GitHub => "https://github.com".to_string(),
            ProviderKind::GitLab => self
                .gitlab_url
                .clone()
                .unwrap_or_else(|| "https://gitlab.com".to_string()),
            ProviderKind::Bitbucket => "https://bitbucket.org".to_string(),
            ProviderKind::AzureDevOps => self.azure_org_url.clone().unwrap_or_default(),
        }
    }

    fn token_for(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::GitHub => self.github_token.as_deref(),
            ProviderKind::GitLab => self.gitlab_token.as_deref(),
            ProviderKind::Bitbucket => self.bitbucket_token.as_deref(),
            ProviderKind::AzureDevOps => self.azure_token.as_deref(),
        }
    }

    fn base_url_for(&self, kind: ProviderKind) -> Option<String> {
        match kind {
            ProviderKind::GitLab => self.gitlab_url.clone(),
            ProviderKind::AzureDevOps => self.azure_org_url.clone(),
            _ => None,
        }
    }

    /// Builds a review agent bound to one provider.
    pub fn agent(&self, kind: ProviderKind) -> GitHostingResult<ReviewAgent> {
        let token = self.token_for(kind).unwrap_or_default().to_string();
        let cfg = ProviderConfig::new(kind, token, self.base_url_for(kind))?;
        let client = ProviderClient::from_config(cfg)?;

        Ok(ReviewAgent::new(
            client,
            CodeAnalyzer::new(self.gemini_api_key.clone()),
        ))
    }
}
