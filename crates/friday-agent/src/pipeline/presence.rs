use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::ChatContext;

/// "Connected users" shown by the chat widget: distinct client sources seen
/// in the presence window, times the configured multiplier, never below one
/// multiplier's worth. Store failures report the floor.
pub fn connected_users<C: ChatContext + ?Sized>(ctx: &C, now: DateTime<Utc>) -> u64 {
    let cfg = ctx.chat_config();
    let floor = cfg.presence_multiplier;
    let since = now - Duration::seconds(cfg.presence_window_secs);
    match ctx.messages().distinct_active_sources(since) {
        Ok(n) => (n as u64).saturating_mul(cfg.presence_multiplier).max(floor),
        Err(e) => {
            warn!(error = %e, "presence count failed");
            floor
        }
    }
}
