use std::sync::Arc;

use friday_core::config::ChatConfig;
use friday_moderation::{Moderator, PatternModerator};
use friday_store::{ContentStore, MessageStore, PolicyStore, SharedConn};

use crate::bridge::tests::{bridge, FakeApi};
use crate::bridge::AssistantSlot;

use super::ChatContext;

/// In-memory host for pipeline tests. All stores share one connection.
pub(crate) struct TestCtx {
    pub conn: SharedConn,
    pub messages: MessageStore,
    pub policy: PolicyStore,
    pub content: ContentStore,
    pub assistant: AssistantSlot,
    pub moderator: PatternModerator,
    pub chat: ChatConfig,
}

impl TestCtx {
    pub(crate) fn new(assistant: AssistantSlot) -> Self {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        friday_store::init_db(&conn).unwrap();
        let conn = friday_store::shared(conn);
        Self {
            messages: MessageStore::new(conn.clone()),
            policy: PolicyStore::new(conn.clone()),
            content: ContentStore::new(conn.clone()),
            conn,
            assistant,
            moderator: PatternModerator,
            chat: ChatConfig::default(),
        }
    }

    pub(crate) fn with_api(api: FakeApi) -> (Self, Arc<FakeApi>) {
        let api = Arc::new(api);
        let ctx = Self::new(AssistantSlot::Ready(bridge(api.clone())));
        (ctx, api)
    }

    /// Rows in chat_messages, soft-deleted ones included.
    pub(crate) fn row_count(&self) -> i64 {
        let db = self.conn.lock().unwrap();
        db.query_row("SELECT COUNT(*) FROM chat_messages", [], |r| r.get(0))
            .unwrap()
    }
}

impl ChatContext for TestCtx {
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
        &self.chat
    }
}
