use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use git_hosting::{ProviderKind, StateFilter};
use review_engine::SearchParams;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, instrument};

use crate::routes::error_response;
use crate::state::AppState;

fn default_server() -> String {
    "github".to_string()
}

fn default_state() -> String {
    "open".to_string()
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default = "default_server")]
    server: String,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    repo: Option<String>,
    #[serde(default = "default_state")]
    state: String,
    #[serde(default = "default_limit")]
    limit: u32,
}

/// `GET /api/search` — delegates to exactly one adapter listing operation,
/// mapping the generic state onto the provider's vocabulary first.
#[instrument(name = "search_route", skip(app))]
pub async fn search_prs(
    State(app): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let kind: ProviderKind = match params.server.parse() {
        Ok(kind) => kind,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err),
    };

    let state: StateFilter = match params.state.parse() {
        Ok(state) => state,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err),
    };

    let agent = match app.agent(kind) {
        Ok(agent) => agent,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    let search = SearchParams {
        query: params.query.clone(),
        username: params.user.clone(),
        repo_url: params.repo.clone(),
        state: kind.native_state(state).to_string(),
        limit: params.limit,
    };

    match agent.search_prs(&search).await {
        Ok(results) => Json(json!({
            "server": params.server,
            "query": params.query,
            "state": params.state,
            "results": results,
        }))
        .into_response(),
        Err(err) => {
            error!("Error searching PRs: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
