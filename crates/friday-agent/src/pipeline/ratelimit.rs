use chrono::{DateTime, Duration, Utc};
use friday_core::config::ChatConfig;
use friday_core::types::SourceId;
use friday_store::{cooldown_remaining, MessageStore};
use tracing::debug;

use super::PipelineError;

/// "Please wait N seconds before sending another message."
pub fn wait_message(secs: u64) -> String {
    format!("אנא המתן {secs} שניות לפני שליחת הודעה נוספת.")
}

/// Minimum spacing between user messages from one source.
///
/// [`RateLimiter::check`] is the read-only early check. The binding check is
/// the one [`MessageStore::insert_gated`] repeats inside the write.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    cooldown: Duration,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn from_config(cfg: &ChatConfig) -> Self {
        Self::new(Duration::seconds(cfg.cooldown_secs as i64))
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Reject when `source` posted less than the cooldown ago. Unknown and
    /// automated sources always pass.
    pub fn check(
        &self,
        store: &MessageStore,
        source: &SourceId,
        now: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        if !source.is_rate_limited() {
            return Ok(());
        }
        let Some(last) = store.last_user_message_at(source)? else {
            return Ok(());
        };
        match cooldown_remaining(last, now, self.cooldown) {
            Some(retry_after_secs) => {
                debug!(%source, retry_after_secs, "rate limited");
                Err(PipelineError::RateLimited { retry_after_secs })
            }
            None => Ok(()),
        }
    }
}
