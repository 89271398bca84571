use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use git_hosting::ProviderKind;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, instrument};

use crate::routes::error_response;
use crate::state::AppState;

fn default_server() -> String {
    "github".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default = "default_server")]
    server: String,
    #[serde(default)]
    repo_url: Option<String>,
    #[serde(default)]
    pr_id: Option<u64>,
    #[serde(default)]
    post_comments: bool,
}

/// `POST /api/review` — runs one full review and returns the scored result.
#[instrument(name = "review_route", skip(app, body))]
pub async fn review_pr(
    State(app): State<Arc<AppState>>,
    Json(body): Json<ReviewRequest>,
) -> Response {
    let (Some(repo_url), Some(pr_id)) = (body.repo_url.clone(), body.pr_id) else {
        return error_response(StatusCode::BAD_REQUEST, "repo_url and pr_id are required");
    };

    let kind: ProviderKind = match body.server.parse() {
        Ok(kind) => kind,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err),
    };

    let agent = match app.agent(kind) {
        Ok(agent) => agent,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    match agent.review_pr(&repo_url, pr_id, body.post_comments).await {
        Ok(result) => Json(json!({
            "server": body.server,
            "repo_url": repo_url,
            "pr_id": pr_id,
            "result": result,
        }))
        .into_response(),
        Err(err) => {
            error!("Error reviewing PR: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
