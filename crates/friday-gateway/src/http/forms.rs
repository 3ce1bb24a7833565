//! Lead-capture form: POST /forms/submit.
//!
//! The submission is recorded locally on a best-effort basis and forwarded
//! to the configured automation webhook, whose answer decides the outcome.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{SecondsFormat, Utc};
use friday_store::types::NewLead;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::origin::{client_source, user_agent};
use super::{error, HttpError};
use crate::app::AppState;

/// Hidden inputs a person never fills in.
const HONEYPOT_FIELDS: [&str; 2] = ["honeypot", "website"];

/// POST /forms/submit
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, HttpError> {
    let mut payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return Err(error(StatusCode::BAD_REQUEST, "invalid JSON body")),
    };

    if HONEYPOT_FIELDS
        .iter()
        .any(|f| payload.get(*f).is_some_and(is_truthy))
    {
        info!("form submission dropped by honeypot");
        return Err(error(StatusCode::BAD_REQUEST, "Invalid request"));
    }

    let client_ip = client_source(&headers).to_string();
    let lead = NewLead {
        first_name: text_field(&payload, "firstName"),
        last_name: text_field(&payload, "lastName"),
        phone: text_field(&payload, "phone"),
        email: text_field(&payload, "email"),
        city: text_field(&payload, "city"),
        ip_address: Some(client_ip.clone()),
        user_agent: Some(user_agent(&headers).unwrap_or("unknown").to_string()),
    };
    let submission_id = match state.content.record_lead(&lead) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "could not record form submission");
            None
        }
    };

    let Some(url) = state.config.forms.webhook_url.as_deref() else {
        warn!("forms.webhook_url not set; submission not forwarded");
        return Err(error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "form webhook not configured",
        ));
    };

    payload.insert("clientIP".into(), json!(client_ip));
    payload.insert(
        "submittedAt".into(),
        json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    let webhook_response = forward(&state.http, url, &payload).await?;

    info!(submission_id = ?submission_id, "form submitted");
    Ok(Json(json!({
        "success": true,
        "message": "Form submitted successfully",
        "webhookResponse": webhook_response,
        "submissionId": submission_id,
    })))
}

/// POST the enriched payload; any non-2xx answer fails the submission.
async fn forward(
    client: &reqwest::Client,
    url: &str,
    payload: &Map<String, Value>,
) -> Result<String, HttpError> {
    let resp = client.post(url).json(payload).send().await.map_err(|e| {
        warn!(error = %e, "form webhook unreachable");
        error(StatusCode::INTERNAL_SERVER_ERROR, "webhook request failed")
    })?;
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        warn!(status = status.as_u16(), body = %text, "form webhook rejected submission");
        return Err(error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Webhook returned {}: {}", status.as_u16(), text),
        ));
    }
    Ok(text)
}

/// Form-style truthiness: empty strings, zero, false and null are unset.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{post_json, router, send, state_with};
    use axum::routing::post;
    use axum::Router;
    use friday_agent::AssistantSlot;
    use friday_core::config::FridayConfig;
    use std::sync::Mutex;

    /// Local stand-in for the automation webhook; records what it receives.
    async fn spawn_webhook(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let sink = seen.clone();
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    (status, "Accepted")
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/hook"), seen)
    }

    fn state_for(url: Option<String>) -> Arc<AppState> {
        let mut config = FridayConfig::default();
        config.forms.webhook_url = url;
        state_with(config, AssistantSlot::MissingApiKey)
    }

    #[tokio::test]
    async fn honeypot_is_rejected_quietly() {
        let (url, seen) = spawn_webhook(StatusCode::OK).await;
        let state = state_for(Some(url));
        let (status, body) = send(
            router(&state),
            post_json(
                "/forms/submit",
                "1.2.3.4",
                json!({ "firstName": "בוט", "website": "http://spam" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forwards_with_origin_and_timestamp() {
        let (url, seen) = spawn_webhook(StatusCode::OK).await;
        let state = state_for(Some(url));
        let (status, body) = send(
            router(&state),
            post_json(
                "/forms/submit",
                "1.2.3.4",
                json!({ "firstName": "נועה", "phone": "0501234567", "honeypot": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["webhookResponse"], "Accepted");
        assert!(body["submissionId"].is_i64());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["clientIP"], "1.2.3.4");
        assert_eq!(seen[0]["firstName"], "נועה");
        assert!(seen[0]["submittedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn webhook_failure_is_500() {
        let (url, _) = spawn_webhook(StatusCode::BAD_GATEWAY).await;
        let state = state_for(Some(url));
        let (status, body) = send(
            router(&state),
            post_json("/forms/submit", "1.2.3.4", json!({ "firstName": "דנה" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Webhook returned 502"));
    }

    #[tokio::test]
    async fn missing_webhook_is_500() {
        let state = state_for(None);
        let (status, _) = send(
            router(&state),
            post_json("/forms/submit", "1.2.3.4", json!({ "firstName": "דנה" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn truthiness_matches_form_semantics() {
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&Value::Null));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(1)));
    }
}
