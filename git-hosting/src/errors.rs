//! Crate-wide error hierarchy for git-hosting.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type GitHostingResult<T> = Result<T, GitHostingError>;

/// Root error type for the git-hosting crate.
#[derive(Debug, Error)]
pub enum GitHostingError {
    /// Provider (GitHub/GitLab/Bitbucket/Azure DevOps) related failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Configuration problems (missing tokens, base URL, etc.).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input validation errors (bad repo URLs, unsupported providers, etc.).
    #[error("validation error: {0}")]
    Validation(String),
}

/// Provider-specific error used inside the adapter layer.
///
/// Adapters never retry: any non-2xx response fails the current operation
/// immediately with the status and response body surfaced to the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-2xx HTTP status with the response body attached.
    #[error("request failed: status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required provider access token.
    #[error("missing access token for {0}")]
    MissingToken(&'static str),

    /// Provider needs an explicit base URL (Azure DevOps organization URL).
    #[error("missing base url for {0}")]
    MissingBaseUrl(&'static str),
}

impl From<reqwest::Error> for GitHostingError {
    fn from(e: reqwest::Error) -> Self {
        GitHostingError::Provider(ProviderError::from(e))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }

        if let Some(status) = e.status() {
            return ProviderError::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            };
        }

        if e.is_decode() {
            return ProviderError::InvalidResponse(e.to_string());
        }

        ProviderError::Network(e.to_string())
    }
}

/// Turns a non-2xx response into [`ProviderError::HttpStatus`] with the
/// response body attached; passes 2xx responses through unchanged.
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}
