//! Public chat surface: POST /chat and the widget's read paths.
//!
//! Request:  `{"question": "...", "messageId": "...", "userId": "...", "userName": "..."}`
//! Response: `{"response": "...", "messageId": "...", "timestamp": "..."}`
//! Error:    `{"error": "...", "response": "..."}` with 400 / 403 / 429 / 500.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use friday_agent::pipeline::{self, ChatReply, ChatTurn, RateLimiter};
use friday_store::types::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::origin::client_source;
use super::{error, pipeline_error, HttpError};
use crate::app::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    pub message_id: Option<String>,
    /// Client-side identity; informational only.
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

/// POST /chat
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatReply>, HttpError> {
    let source = client_source(&headers);

    // Cheap refusal before the body is even parsed; the store repeats the
    // check atomically when it writes.
    RateLimiter::from_config(&state.config.chat)
        .check(&state.messages, &source, Utc::now())
        .map_err(pipeline_error)?;

    let req: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(source = %source, error = %e, "invalid JSON in chat body");
        error(StatusCode::BAD_REQUEST, "invalid JSON body")
    })?;
    debug!(source = %source, user_id = ?req.user_id, "chat message arrived");

    let turn = ChatTurn {
        question: req.question,
        message_id: req.message_id,
        user_name: req.user_name,
        source,
    };
    let reply = pipeline::process_chat(state.as_ref(), turn)
        .await
        .map_err(pipeline_error)?;
    Ok(Json(reply))
}

/// GET /chat/connected-users
pub async fn connected_users_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let count = pipeline::connected_users(state.as_ref(), Utc::now());
    Json(json!({ "count": count }))
}

// ── Feed ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    /// Only messages strictly older than this instant.
    pub before: Option<DateTime<Utc>>,
}

/// A chat message as every visitor sees it (no network origin).
#[derive(Debug, Serialize)]
pub struct PublicMessage {
    pub id: String,
    pub user_name: String,
    pub message_text: String,
    pub is_ai: bool,
    pub reply_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for PublicMessage {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            user_name: m.user_name,
            message_text: m.message_text,
            is_ai: m.is_ai,
            reply_to: m.reply_to,
            created_at: m.created_at,
        }
    }
}

/// GET /chat/messages?limit=&before=, oldest first.
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Value>, HttpError> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let messages = state.messages.history(limit, q.before).map_err(|e| {
        warn!(error = %e, "history query failed");
        error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    })?;
    let messages: Vec<PublicMessage> = messages.into_iter().map(PublicMessage::from).collect();
    Ok(Json(json!({ "messages": messages })))
}

/// GET /chat/announcements: active, unexpired banners.
pub async fn announcements_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, HttpError> {
    let announcements = state.content.active_announcements(Utc::now()).map_err(|e| {
        warn!(error = %e, "announcement query failed");
        error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    })?;
    Ok(Json(json!({ "announcements": announcements })))
}
