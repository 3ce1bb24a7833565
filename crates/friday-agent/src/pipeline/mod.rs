//! Chat ingestion: rate limit → block list → moderation → store → assistant
//! → post-process → store.
//!
//! Hosts (the HTTP gateway, tests) implement [`ChatContext`] and call
//! [`process_chat`] or [`auto_post`].

pub mod autopost;
pub mod blocklist;
pub mod context;
pub mod postprocess;
pub mod presence;
pub mod process;
pub mod ratelimit;
#[cfg(test)]
mod testing;

pub use autopost::{auto_post, AutoPostOutcome};
pub use blocklist::BlockGate;
pub use context::ChatContext;
pub use postprocess::{post_process, PostOutcome, Processed};
pub use presence::connected_users;
pub use process::{process_chat, ChatReply, ChatTurn};
pub use ratelimit::RateLimiter;

use friday_moderation::{NameError, Reason};
use friday_store::StoreError;

use crate::provider::AssistantError;

/// Generic retry prompt shown for any upstream failure.
pub const RETRY_MESSAGE: &str = "מצטער, משהו השתבש. נסו שוב בעוד רגע.";

/// Everything that can stop a chat message, grouped the way callers react:
/// validation, policy, upstream.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("invalid display name: {0}")]
    InvalidName(NameError),

    #[error("source is blocked")]
    Blocked,

    #[error("content rejected: {0}")]
    Rejected(Reason),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("assistant API key not configured")]
    MissingApiKey,

    #[error("assistant id not configured")]
    MissingAssistantId,

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// HTTP status the gateway answers with.
    pub fn status(&self) -> u16 {
        match self {
            PipelineError::EmptyQuestion
            | PipelineError::InvalidName(_)
            | PipelineError::Rejected(_) => 400,
            PipelineError::Blocked => 403,
            PipelineError::RateLimited { .. } => 429,
            PipelineError::MissingApiKey
            | PipelineError::MissingAssistantId
            | PipelineError::Assistant(_)
            | PipelineError::Store(_) => 500,
        }
    }

    /// Short localised error for the `error` field.
    pub fn error_message(&self) -> String {
        match self {
            PipelineError::EmptyQuestion => "שאלה חייבת להיות מוגדרת".to_string(),
            PipelineError::InvalidName(e) => e.to_string(),
            PipelineError::Blocked => "כתובת ה-IP שלך חסומה".to_string(),
            PipelineError::Rejected(_) => "השאלה מכילה תוכן לא מתאים".to_string(),
            PipelineError::RateLimited { .. } => "Rate limit exceeded".to_string(),
            PipelineError::MissingApiKey => "שירות AI לא זמין כרגע".to_string(),
            PipelineError::MissingAssistantId => "Assistant לא מוגדר".to_string(),
            PipelineError::Assistant(e) => e.user_message().to_string(),
            PipelineError::Store(_) => "שגיאה פנימית".to_string(),
        }
    }

    /// Text the chat widget shows in place of a reply, when there is one.
    pub fn user_response(&self) -> Option<String> {
        match self {
            PipelineError::Blocked => Some(
                "כתובת ה-IP שלך חסומה מהצאט. אתה יכול לצפות בהודעות אבל לא לכתוב.".to_string(),
            ),
            PipelineError::Rejected(reason) => Some(reason.message().to_string()),
            PipelineError::RateLimited { retry_after_secs } => {
                Some(ratelimit::wait_message(*retry_after_secs))
            }
            PipelineError::Assistant(_) => Some(RETRY_MESSAGE.to_string()),
            _ => None,
        }
    }
}
