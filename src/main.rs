use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use git_hosting::{
    ProviderClient, ProviderConfig, ProviderKind, PullRequestSummary, StateFilter,
};
use review_engine::{CodeAnalyzer, FeedbackKind, ReviewAgent, SearchParams};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pr-review-agent", version, about = "Review and search pull requests across git-hosting providers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a specific PR
    Review {
        /// Git server: github, gitlab, bitbucket or azure
        #[arg(long, default_value = "github")]
        server: String,
        /// Repository URL
        #[arg(long)]
        repo: String,
        /// Pull request ID
        #[arg(long)]
        pr: u64,
        /// Post feedback as comments on the PR
        #[arg(long)]
        post_comments: bool,
        /// Provider access token (falls back to the provider's env var)
        #[arg(long)]
        token: Option<String>,
        /// Provider base URL (GitLab instance or Azure DevOps org URL)
        #[arg(long)]
        base_url: Option<String>,
        /// Gemini API key enabling AI analysis (falls back to GEMINI_API_KEY)
        #[arg(long)]
        gemini_key: Option<String>,
    },
    /// Search for PRs
    Search {
        /// Git server: github, gitlab, bitbucket or azure
        #[arg(long, default_value = "github")]
        server: String,
        /// Search query
        #[arg(long)]
        query: Option<String>,
        /// Username to filter PRs by author
        #[arg(long)]
        user: Option<String>,
        /// Repository URL to filter PRs by repository
        #[arg(long)]
        repo: Option<String>,
        /// PR state: open, closed or all
        #[arg(long, default_value = "open")]
        state: String,
        /// Number of results to return
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Provider access token (falls back to the provider's env var)
        #[arg(long)]
        token: Option<String>,
        /// Provider base URL (GitLab instance or Azure DevOps org URL)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Start the HTTP service
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment files are optional; real env vars still apply.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Review {
            server,
            repo,
            pr,
            post_comments,
            token,
            base_url,
            gemini_key,
        } => {
            let agent = build_agent(&server, token, base_url, gemini_key)?;
            let result = agent
                .review_pr(&repo, pr, post_comments)
                .await
                .context("Error reviewing PR")?;

            let title = result
                .pr_details
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or("<unknown>");

            println!("PR Title: {title}");
            println!("Quality Score: {:.1}/100", result.score);
            println!("Feedback Items: {}", result.feedback.len());

            for (i, item) in result.feedback.iter().enumerate() {
                println!(
                    "\n{}. [{}] {}",
                    i + 1,
                    colorize_kind(item.kind),
                    item.message
                );
                if let Some(line) = item.line {
                    println!("   Line: {line}");
                }
                if let Some(snippet) = &item.code_snippet {
                    println!("   Code: {snippet}");
                }
            }
        }
        Commands::Search {
            server,
            query,
            user,
            repo,
            state,
            limit,
            token,
            base_url,
        } => {
            let kind: ProviderKind = server.parse().map_err(|e: String| anyhow!(e))?;
            let state: StateFilter = state.parse().map_err(|e: String| anyhow!(e))?;
            let agent = build_agent(&server, token, base_url, None)?;

            let params = SearchParams {
                query,
                username: user,
                repo_url: repo,
                state: kind.native_state(state).to_string(),
                limit,
            };

            let prs = agent
                .search_prs(&params)
                .await
                .context("Error searching PRs")?;
            display_prs(&prs);
        }
        Commands::Serve => {
            api::start().await.map_err(|e| anyhow!(e.to_string()))?;
        }
    }

    Ok(())
}

/// Builds a review agent for one provider, resolving credentials from CLI
/// flags first and the provider's environment variables second.
fn build_agent(
    server: &str,
    token: Option<String>,
    base_url: Option<String>,
    gemini_key: Option<String>,
) -> anyhow::Result<ReviewAgent> {
    let kind: ProviderKind = server.parse().map_err(|e: String| anyhow!(e))?;

    let token = token
        .or_else(|| std::env::var(token_env(kind)).ok())
        .unwrap_or_default();
    let base_url = base_url.or_else(|| base_url_env(kind).and_then(|v| std::env::var(v).ok()));
    let gemini_key = gemini_key.or_else(|| std::env::var("GEMINI_API_KEY").ok());

    let cfg = ProviderConfig::new(kind, token, base_url)?;
    let client = ProviderClient::from_config(cfg)?;

    Ok(ReviewAgent::new(client, CodeAnalyzer::new(gemini_key)))
}

fn token_env(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::GitHub => "GITHUB_TOKEN",
        ProviderKind::GitLab => "GITLAB_TOKEN",
        ProviderKind::Bitbucket => "BITBUCKET_TOKEN",
        ProviderKind::AzureDevOps => "AZURE_DEVOPS_TOKEN",
    }
}

fn base_url_env(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::GitLab => Some("GITLAB_URL"),
        ProviderKind::AzureDevOps => Some("AZURE_DEVOPS_ORG_URL"),
        _ => None,
    }
}

fn colorize_kind(kind: FeedbackKind) -> String {
    match kind {
        FeedbackKind::Error => kind.label().red().to_string(),
        FeedbackKind::Warning => kind.label().yellow().to_string(),
        FeedbackKind::Info => kind.label().blue().to_string(),
        FeedbackKind::Suggestion => kind.label().green().to_string(),
        FeedbackKind::Other => kind.label().to_string(),
    }
}

fn display_prs(prs: &[PullRequestSummary]) {
    if prs.is_empty() {
        println!("No pull requests found.");
        return;
    }

    println!(
        "{:<8} {:<30} {:<50} {:<10} {}",
        "ID", "Repository", "Title", "State", "URL"
    );
    println!("{}", "-".repeat(120));

    for pr in prs {
        let repo_name = truncate(&format!("{}/{}", pr.repo_owner, pr.repo_name), 28);
        let title = truncate(&pr.title, 48);

        println!(
            "{:<8} {:<30} {:<50} {:<10} {}",
            pr.id, repo_name, title, pr.state, pr.url
        );
    }
}

/// Shortens a cell to `max` chars, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
