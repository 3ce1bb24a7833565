//! Scheduler trigger: GET|POST /cron/auto-post-question.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use friday_agent::pipeline::{self, AutoPostOutcome};
use friday_core::config::AutopostConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use super::origin::{bearer_token, user_agent};
use super::{error, pipeline_error, HttpError};
use crate::app::AppState;

/// GET|POST /cron/auto-post-question
pub async fn auto_post_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, HttpError> {
    if let Err(reason) = verify_scheduler(&state.config.autopost, &headers) {
        warn!(reason = %reason, "auto-post trigger refused");
        return Err(error(StatusCode::UNAUTHORIZED, "Unauthorized"));
    }

    let outcome = pipeline::auto_post(state.as_ref())
        .await
        .map_err(pipeline_error)?;
    Ok(Json(outcome_body(outcome)))
}

pub fn outcome_body(outcome: AutoPostOutcome) -> Value {
    match outcome {
        AutoPostOutcome::AllSent => json!({
            "message": "אין שאלות חדשות לפרסום",
            "allSent": true,
        }),
        AutoPostOutcome::PostedWithoutAssistant {
            question,
            user_name,
        } => json!({
            "message": "שאלה פורסמה אבל AI לא מוגדר",
            "question": question,
            "userName": user_name,
        }),
        AutoPostOutcome::Answered {
            question,
            user_name,
            response,
        } => json!({
            "success": true,
            "question": question,
            "userName": user_name,
            "response": response,
        }),
    }
}

// ── Auth helpers ──────────────────────────────────────────────────────────────

/// With a configured secret, require `Authorization: Bearer <secret>`.
/// Without one, accept only requests that identify as the platform cron.
fn verify_scheduler(cfg: &AutopostConfig, headers: &HeaderMap) -> Result<(), String> {
    match cfg.cron_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => {
            let token = bearer_token(headers)
                .ok_or_else(|| "missing bearer token".to_string())?;
            if token == secret {
                Ok(())
            } else {
                Err("cron secret mismatch".to_string())
            }
        }
        None => {
            let from_cron = headers.contains_key("x-vercel-cron")
                || user_agent(headers).is_some_and(|ua| ua.contains("vercel-cron"));
            if from_cron {
                Ok(())
            } else {
                Err("request does not come from the scheduler".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{router, send, state_replying, state_with};
    use axum::body::Body;
    use axum::http::Request;
    use friday_agent::AssistantSlot;
    use friday_core::config::FridayConfig;

    fn trigger(header: Option<(&str, &str)>) -> Request<Body> {
        let mut b = Request::builder().method("POST").uri("/cron/auto-post-question");
        if let Some((k, v)) = header {
            b = b.header(k, v);
        }
        b.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn without_secret_only_the_cron_may_trigger() {
        let (state, _) = state_replying("ok");
        let (status, _) = send(router(&state), trigger(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(router(&state), trigger(Some(("x-vercel-cron", "1")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allSent"], true);

        let (status, _) =
            send(router(&state), trigger(Some(("user-agent", "vercel-cron/1.0")))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn configured_secret_is_required() {
        let mut config = FridayConfig::default();
        config.autopost.cron_secret = Some("s3cret".into());
        let state = state_with(config, AssistantSlot::MissingApiKey);

        let (status, _) = send(router(&state), trigger(Some(("x-vercel-cron", "1")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) =
            send(router(&state), trigger(Some(("authorization", "Bearer nope")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) =
            send(router(&state), trigger(Some(("authorization", "Bearer s3cret")))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn posts_and_answers_a_seed() {
        let (state, api) = state_replying("נתראה ביום שישי!");
        state.content.add_seed("מתי נפתחים?", "רותי").unwrap();

        let (status, body) = send(router(&state), trigger(Some(("x-vercel-cron", "1")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["question"], "מתי נפתחים?");
        assert_eq!(body["userName"], "רותי");
        assert_eq!(body["response"], "נתראה ביום שישי!");
        assert_eq!(api.asked(), 1);
        assert_eq!(state.content.count_unsent().unwrap(), 0);
    }

    #[tokio::test]
    async fn posts_without_assistant() {
        let state = state_with(FridayConfig::default(), AssistantSlot::MissingAssistantId);
        state.content.add_seed("איפה החניה?", "משה").unwrap();

        let (status, body) = send(router(&state), trigger(Some(("x-vercel-cron", "1")))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"], "איפה החניה?");
        assert!(body.get("response").is_none());
        assert_eq!(state.content.count_unsent().unwrap(), 0);
    }
}
