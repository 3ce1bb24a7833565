//! Admin API: POST /admin/{resource} with `{"action": "...", ...}`.
//!
//! Resources: `messages`, `blocked-ips`, `forbidden-words`, `announcements`.
//! Auth: `Authorization: Bearer <token>` resolving to a user in the
//! administrators table; 401 without a valid token, 403 for non-admins.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use friday_core::types::SourceId;
use friday_store::types::{AnnouncementPatch, NewAnnouncement};
use friday_store::StoreError;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::origin::bearer_token;
use super::{error, HttpError};
use crate::app::AppState;

const DEFAULT_PAGE: u64 = 50;

/// POST /admin/{resource}
pub async fn admin_handler(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, HttpError> {
    let admin = authorize(&state, &headers)?;

    // An unreadable body behaves like an empty one: no action, so 404.
    let mut data = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let action = match data.remove("action") {
        Some(Value::String(a)) => a,
        _ => String::new(),
    };
    info!(admin = %admin, resource = %resource, action = %action, "admin request");

    match (resource.as_str(), action.as_str()) {
        ("messages", "list") => {
            let limit = data.get("limit").and_then(Value::as_u64).unwrap_or(DEFAULT_PAGE);
            let offset = data.get("offset").and_then(Value::as_u64).unwrap_or(0);
            let messages = state
                .messages
                .list_visible(limit as usize, offset as usize)
                .map_err(store_error)?;
            Ok(Json(json!({ "messages": messages })))
        }
        ("messages", "delete") => {
            let id = string_field(&data, "messageId")?;
            let deleted = state.messages.soft_delete(&id, Utc::now()).map_err(store_error)?;
            if !deleted {
                return Err(error(StatusCode::NOT_FOUND, "message not found"));
            }
            Ok(success())
        }

        ("blocked-ips", "list") => {
            let blocked = state.policy.list_blocked().map_err(store_error)?;
            Ok(Json(json!({ "blocked": blocked })))
        }
        ("blocked-ips", "add") => {
            let ip = SourceId::from(string_field(&data, "ip_address")?);
            let reason = data.get("reason").and_then(Value::as_str);
            let entry = state.policy.block(&ip, reason).map_err(store_error)?;
            Ok(Json(json!({ "success": true, "entry": entry })))
        }
        ("blocked-ips", "remove") => {
            state.policy.unblock(id_field(&data, "id")?).map_err(store_error)?;
            Ok(success())
        }

        ("forbidden-words", "list") => {
            let mut words = state.policy.list_terms().map_err(store_error)?;
            words.reverse();
            Ok(Json(json!({ "words": words })))
        }
        ("forbidden-words", "add") => {
            let word = string_field(&data, "word")?;
            let term = state.policy.add_term(&word).map_err(store_error)?;
            Ok(Json(json!({ "success": true, "word": term })))
        }
        ("forbidden-words", "remove") => {
            state.policy.remove_term(id_field(&data, "id")?).map_err(store_error)?;
            Ok(success())
        }

        ("announcements", "list") => {
            let announcements = state.content.list_announcements().map_err(store_error)?;
            Ok(Json(json!({ "announcements": announcements })))
        }
        ("announcements", "create") => {
            let new: NewAnnouncement = payload(data)?;
            let announcement = state.content.create_announcement(&new).map_err(store_error)?;
            Ok(Json(json!({ "announcement": announcement })))
        }
        ("announcements", "update") => {
            let id = id_field(&data, "id")?;
            data.remove("id");
            let patch: AnnouncementPatch = payload(data)?;
            let announcement = state
                .content
                .update_announcement(id, &patch)
                .map_err(store_error)?;
            Ok(Json(json!({ "success": true, "announcement": announcement })))
        }
        ("announcements", "delete") => {
            state
                .content
                .delete_announcement(id_field(&data, "id")?)
                .map_err(store_error)?;
            Ok(success())
        }

        _ => Err(error(StatusCode::NOT_FOUND, "Action not found")),
    }
}

// ── Auth helpers ──────────────────────────────────────────────────────────────

/// Resolve the bearer token to an administrator's user id.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, HttpError> {
    let token = bearer_token(headers).ok_or_else(unauthenticated)?;
    let user = state
        .admins
        .resolve_token(token, Utc::now())
        .map_err(store_error)?
        .ok_or_else(unauthenticated)?;
    if !state.admins.is_admin(&user).map_err(store_error)? {
        warn!(user = %user, "admin API refused for non-admin");
        return Err(error(StatusCode::FORBIDDEN, "אין לך הרשאות אדמין"));
    }
    Ok(user)
}

fn unauthenticated() -> HttpError {
    error(StatusCode::UNAUTHORIZED, "לא מאומת")
}

// ── Body helpers ──────────────────────────────────────────────────────────────

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

fn string_field(data: &Map<String, Value>, key: &str) -> Result<String, HttpError> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, format!("missing '{key}'")))
}

/// Row ids arrive as numbers from some clients and strings from others.
fn id_field(data: &Map<String, Value>, key: &str) -> Result<i64, HttpError> {
    match data.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| error(StatusCode::BAD_REQUEST, format!("missing or invalid '{key}'")))
}

fn payload<T: DeserializeOwned>(data: Map<String, Value>) -> Result<T, HttpError> {
    serde_json::from_value(Value::Object(data))
        .map_err(|e| error(StatusCode::BAD_REQUEST, format!("invalid payload: {e}")))
}

fn store_error(e: StoreError) -> HttpError {
    match e {
        StoreError::NotFound { .. } => error(StatusCode::NOT_FOUND, e.to_string()),
        StoreError::Invalid(_) => error(StatusCode::BAD_REQUEST, e.to_string()),
        other => {
            warn!(error = %other, "admin store operation failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
