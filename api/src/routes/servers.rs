use std::sync::Arc;

use axum::{Json, extract::State};
use git_hosting::ProviderKind;
use serde_json::{Map, Value, json};

use crate::state::AppState;

/// `GET /api/servers` — configuration status per supported provider.
pub async fn list_servers(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut servers = Map::new();

    for kind in ProviderKind::ALL {
        servers.insert(
            kind.id().to_string(),
            json!({
                "name": kind.label(),
                "configured": state.is_configured(kind),
                "url": state.display_url(kind),
            }),
        );
    }

    Json(Value::Object(servers))
}
