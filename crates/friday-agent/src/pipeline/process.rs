//! Live chat turn: one question in, one (post-processed) reply out.

use chrono::{DateTime, Utc};
use friday_core::types::{MessageId, SourceId};
use friday_moderation::{validate_display_name, TermSet, Verdict};
use friday_store::types::NewChatMessage;
use friday_store::{GateOutcome, StoreError};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::bridge::AssistantSlot;
use crate::prompt::CHAT_INSTRUCTIONS;

use super::postprocess::{post_process, PostOutcome};
use super::{BlockGate, ChatContext, PipelineError, RateLimiter};

/// An inbound chat message as the host received it.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    /// Client-chosen id; also the deduplication key for the widget.
    pub message_id: Option<String>,
    pub user_name: Option<String>,
    pub source: SourceId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    /// Id under which the user's message was stored.
    pub message_id: String,
    /// Id of the stored assistant reply; `None` if that write failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub outcome: PostOutcome,
}

/// Dynamic forbidden words; an unreadable list degrades to the baseline.
pub(crate) fn load_terms<C: ChatContext + ?Sized>(ctx: &C) -> Vec<String> {
    ctx.policy().term_strings().unwrap_or_else(|e| {
        warn!(error = %e, "forbidden word list unavailable");
        Vec::new()
    })
}

/// Run the whole chat pipeline for `turn`.
///
/// Policy checks happen before anything is written. Once the user message
/// is stored, an assistant failure leaves it in place and is returned as
/// [`PipelineError::Assistant`]; a failed reply write is only logged.
#[instrument(skip(ctx, turn), fields(source = %turn.source))]
pub async fn process_chat<C: ChatContext + ?Sized>(
    ctx: &C,
    turn: ChatTurn,
) -> Result<ChatReply, PipelineError> {
    let cfg = ctx.chat_config();
    let limiter = RateLimiter::from_config(cfg);
    limiter.check(ctx.messages(), &turn.source, Utc::now())?;

    let question = turn.question.trim();
    if question.is_empty() {
        return Err(PipelineError::EmptyQuestion);
    }

    BlockGate::check(ctx.policy(), &turn.source)?;

    let dynamic = load_terms(ctx);
    let terms = TermSet::with_dynamic(&dynamic);
    if let Verdict::Rejected(reason) = ctx.moderator().classify(question, &terms) {
        info!(%reason, "question rejected");
        return Err(PipelineError::Rejected(reason));
    }

    let user_name = match turn.user_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            validate_display_name(name, &dynamic).map_err(PipelineError::InvalidName)?
        }
        _ => cfg.default_user_name.clone(),
    };

    let bridge = match ctx.assistant() {
        AssistantSlot::Ready(bridge) => bridge,
        AssistantSlot::MissingApiKey => return Err(PipelineError::MissingApiKey),
        AssistantSlot::MissingAssistantId => return Err(PipelineError::MissingAssistantId),
    };

    let message_id = store_user_message(ctx, &turn, question, &user_name, &limiter)?;
    debug!(%message_id, "user message stored");

    let raw = bridge.ask(question, CHAT_INSTRUCTIONS).await.map_err(|e| {
        warn!(code = e.code(), error = %e, "assistant bridge failed");
        PipelineError::Assistant(e)
    })?;

    let processed = post_process(&raw, ctx.moderator(), &terms);
    if processed.outcome != PostOutcome::Kept {
        info!(outcome = ?processed.outcome, "assistant reply replaced");
    }

    let reply = NewChatMessage::assistant(&cfg.bot_name, &processed.text, Some(message_id.clone()));
    let reply_id = match ctx.messages().insert(&reply) {
        Ok(()) => Some(reply.id.to_string()),
        Err(e) => {
            warn!(error = %e, "failed to store assistant reply");
            None
        }
    };

    Ok(ChatReply {
        response: processed.text,
        message_id: message_id.to_string(),
        reply_id,
        timestamp: Utc::now(),
        outcome: processed.outcome,
    })
}

/// Cooldown-gated insert. A taken id is replaced by a fresh one once.
fn store_user_message<C: ChatContext + ?Sized>(
    ctx: &C,
    turn: &ChatTurn,
    question: &str,
    user_name: &str,
    limiter: &RateLimiter,
) -> Result<MessageId, PipelineError> {
    let id = turn
        .message_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(MessageId::from)
        .unwrap_or_default();
    let mut msg = NewChatMessage::user(id, user_name, question, turn.source.clone());

    let outcome = match ctx.messages().insert_gated(&msg, limiter.cooldown()) {
        Err(StoreError::DuplicateId(taken)) => {
            debug!(%taken, "message id already used, assigning a new one");
            msg.id = MessageId::new();
            ctx.messages().insert_gated(&msg, limiter.cooldown())?
        }
        other => other?,
    };

    match outcome {
        GateOutcome::Inserted => Ok(msg.id),
        GateOutcome::CoolingDown { retry_after_secs } => {
            Err(PipelineError::RateLimited { retry_after_secs })
        }
    }
}
