use chrono::{DateTime, Utc};
use friday_core::types::{MessageId, SourceId};
use serde::{Deserialize, Serialize};

/// A persisted chat message. Soft-deleted rows never leave the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_name: String,
    pub message_text: String,
    pub is_ai: bool,
    /// Weak back-reference to the message this one answers.
    pub reply_to: Option<String>,
    pub ip_address: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`crate::MessageStore`].
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub id: MessageId,
    pub user_name: String,
    pub message_text: String,
    pub is_ai: bool,
    pub reply_to: Option<MessageId>,
    pub source: SourceId,
    pub created_at: DateTime<Utc>,
}

impl NewChatMessage {
    /// A user-authored message from `source`.
    pub fn user(id: MessageId, user_name: &str, text: &str, source: SourceId) -> Self {
        Self {
            id,
            user_name: user_name.to_string(),
            message_text: text.to_string(),
            is_ai: false,
            reply_to: None,
            source,
            created_at: Utc::now(),
        }
    }

    /// An assistant reply, always attributed to the `system` source.
    pub fn assistant(bot_name: &str, text: &str, reply_to: Option<MessageId>) -> Self {
        Self {
            id: MessageId::new(),
            user_name: bot_name.to_string(),
            message_text: text.to_string(),
            is_ai: true,
            reply_to,
            source: SourceId::system(),
            created_at: Utc::now(),
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEntry {
    pub id: i64,
    pub ip_address: String,
    pub reason: Option<String>,
    pub blocked_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForbiddenTerm {
    pub id: i64,
    pub word: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: Option<String>,
    pub text: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub expires_at: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAnnouncement {
    pub title: Option<String>,
    pub text: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    /// RFC 3339; normalised to UTC on write.
    pub expires_at: Option<String>,
}

/// Partial update: `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub expires_at: Option<String>,
    pub is_active: Option<bool>,
}

/// Scripted question posted by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedQuestion {
    pub id: i64,
    pub question_text: String,
    pub user_name: String,
    pub is_sent: bool,
    pub sent_at: Option<String>,
}

/// Lead-capture form row. Every field is optional; the form is forwarded
/// to the webhook regardless of what was recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLead {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
