use friday_core::types::SourceId;
use friday_store::PolicyStore;
use tracing::{info, warn};

use super::PipelineError;

/// Exact-match block list check run before anything is written.
pub struct BlockGate;

impl BlockGate {
    /// `Err(Blocked)` for a listed source. A failed lookup lets the message
    /// through; moderation and rate limiting still apply.
    pub fn check(policy: &PolicyStore, source: &SourceId) -> Result<(), PipelineError> {
        match policy.is_blocked(source) {
            Ok(true) => {
                info!(%source, "blocked source rejected");
                Err(PipelineError::Blocked)
            }
            Ok(false) => Ok(()),
            Err(e) => {
                warn!(%source, error = %e, "block list lookup failed");
                Ok(())
            }
        }
    }
}
