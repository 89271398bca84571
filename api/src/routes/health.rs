use axum::Json;
use git_hosting::ProviderKind;
use serde_json::{Value, json};

/// `GET /api/health`
pub async fn health_check() -> Json<Value> {
    let supported: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.id()).collect();

    Json(json!({
        "status": "healthy",
        "message": "PR Review Agent API is running",
        "supported_servers": supported,
    }))
}
