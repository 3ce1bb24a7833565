//! Host interface for the chat pipeline.

use friday_core::config::ChatConfig;
use friday_moderation::Moderator;
use friday_store::{ContentStore, MessageStore, PolicyStore};

use crate::bridge::AssistantSlot;

/// Everything the pipeline reads or writes, supplied by the host.
///
/// Implemented by `AppState` in `friday-gateway` and by test fixtures.
pub trait ChatContext: Send + Sync {
    fn messages(&self) -> &MessageStore;
    fn policy(&self) -> &PolicyStore;
    fn content(&self) -> &ContentStore;
    fn assistant(&self) -> &AssistantSlot;
    fn moderator(&self) -> &dyn Moderator;
    fn chat_config(&self) -> &ChatConfig;
}
