use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness probe, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "assistant": state.assistant.bridge().is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::testing::{get, router, send, state_replying, state_with};
    use axum::http::StatusCode;
    use friday_agent::AssistantSlot;
    use friday_core::config::FridayConfig;

    #[tokio::test]
    async fn reports_assistant_readiness() {
        let (state, _) = state_replying("ok");
        let (status, body) = send(router(&state), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["assistant"], true);

        let state = state_with(FridayConfig::default(), AssistantSlot::MissingApiKey);
        let (_, body) = send(router(&state), get("/health")).await;
        assert_eq!(body["assistant"], false);
    }
}
