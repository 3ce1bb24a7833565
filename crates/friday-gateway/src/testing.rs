//! Router fixtures: in-memory database and a scripted assistant.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use friday_agent::{ApiError, AssistantApi, AssistantBridge, AssistantSlot, Run, RunStatus, ThreadMessage};
use friday_core::config::FridayConfig;
use friday_store::{AdminDirectory, ContentStore, MessageStore, PolicyStore, SharedConn};
use serde_json::Value;
use tower::ServiceExt;

use crate::app::{build_router, AppState};

/// Answers every question with the same text, instantly.
pub struct ScriptedApi {
    reply: String,
    threads: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            threads: AtomicUsize::new(0),
        })
    }

    /// Number of questions asked so far.
    pub fn asked(&self) -> usize {
        self.threads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssistantApi for ScriptedApi {
    async fn create_thread(&self) -> Result<String, ApiError> {
        let n = self.threads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("thread_{n}"))
    }

    async fn add_message(&self, _thread_id: &str, _content: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
        _instructions: &str,
    ) -> Result<Run, ApiError> {
        Ok(Run {
            id: "run_1".into(),
            status: RunStatus::Completed,
        })
    }

    async fn get_run(&self, _thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        Ok(Run {
            id: run_id.into(),
            status: RunStatus::Completed,
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        Ok(vec![ThreadMessage {
            role: "assistant".into(),
            created_at: 1,
            text: Some(self.reply.clone()),
        }])
    }
}

pub fn memory_db() -> SharedConn {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    friday_store::init_db(&conn).unwrap();
    friday_store::shared(conn)
}

pub fn state_with(config: FridayConfig, assistant: AssistantSlot) -> Arc<AppState> {
    let db = memory_db();
    Arc::new(AppState::new(
        config,
        MessageStore::new(db.clone()),
        PolicyStore::new(db.clone()),
        ContentStore::new(db.clone()),
        AdminDirectory::new(db),
        assistant,
    ))
}

/// State whose assistant always replies `reply`.
pub fn state_replying(reply: &str) -> (Arc<AppState>, Arc<ScriptedApi>) {
    let api = ScriptedApi::new(reply);
    let bridge = AssistantBridge::new(api.clone(), "asst_test", Duration::from_millis(1), 5);
    (
        state_with(FridayConfig::default(), AssistantSlot::Ready(bridge)),
        api,
    )
}

pub fn router(state: &Arc<AppState>) -> Router {
    build_router(state.clone())
}

/// Send one request and decode the JSON body (`Null` when empty).
pub async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn post_json(uri: &str, ip: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
