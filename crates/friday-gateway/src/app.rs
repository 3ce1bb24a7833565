use axum::{
    routing::{get, post},
    Router,
};
use friday_agent::pipeline::ChatContext;
use friday_agent::AssistantSlot;
use friday_core::config::{ChatConfig, FridayConfig};
use friday_moderation::{Moderator, PatternModerator};
use friday_store::{AdminDirectory, ContentStore, MessageStore, PolicyStore};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: FridayConfig,
    pub messages: MessageStore,
    pub policy: PolicyStore,
    pub content: ContentStore,
    pub admins: AdminDirectory,
    pub assistant: AssistantSlot,
    pub moderator: PatternModerator,
    /// Outbound client for the lead-form webhook.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: FridayConfig,
        messages: MessageStore,
        policy: PolicyStore,
        content: ContentStore,
        admins: AdminDirectory,
        assistant: AssistantSlot,
    ) -> Self {
        Self {
            config,
            messages,
            policy,
            content,
            admins,
            assistant,
            moderator: PatternModerator,
            http: reqwest::Client::new(),
        }
    }
}

impl ChatContext for AppState {
    fn messages(&self) -> &MessageStore {
        &self.messages
    }

    fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    fn content(&self) -> &ContentStore {
        &self.content
    }

    fn assistant(&self) -> &AssistantSlot {
        &self.assistant
    }

    fn moderator(&self) -> &dyn Moderator {
        &self.moderator
    }

    fn chat_config(&self) -> &ChatConfig {
        &self.config.chat
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/chat", post(crate::http::chat::chat_handler))
        .route(
            "/chat/connected-users",
            get(crate::http::chat::connected_users_handler),
        )
        .route("/chat/messages", get(crate::http::chat::history_handler))
        .route(
            "/chat/announcements",
            get(crate::http::chat::announcements_handler),
        )
        .route(
            "/admin/{resource}",
            post(crate::http::admin::admin_handler),
        )
        .route(
            "/cron/auto-post-question",
            get(crate::http::autopost::auto_post_handler)
                .post(crate::http::autopost::auto_post_handler),
        )
        .route("/forms/submit", post(crate::http::forms::submit_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
