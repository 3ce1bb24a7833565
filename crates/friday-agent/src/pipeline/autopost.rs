//! Scheduled seed questions: post one, answer it, mark it sent.

use chrono::Utc;
use friday_core::types::{MessageId, SourceId};
use friday_moderation::TermSet;
use friday_store::types::NewChatMessage;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::prompt::AUTOPOST_INSTRUCTIONS;

use super::postprocess::post_process;
use super::process::load_terms;
use super::{ChatContext, PipelineError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AutoPostOutcome {
    /// Every seed question has been posted already.
    AllSent,
    /// Question posted; no assistant configured to answer it.
    PostedWithoutAssistant { question: String, user_name: String },
    Answered {
        question: String,
        user_name: String,
        response: String,
    },
}

/// Post one random unsent seed question and answer it.
///
/// The seed is marked sent once its message is stored, whether or not the
/// assistant succeeds, so a failing assistant cannot make the scheduler
/// repost the same question forever.
#[instrument(skip(ctx))]
pub async fn auto_post<C: ChatContext + ?Sized>(ctx: &C) -> Result<AutoPostOutcome, PipelineError> {
    let Some(seed) = ctx.content().pick_unsent_random()? else {
        info!("no unsent seed questions");
        return Ok(AutoPostOutcome::AllSent);
    };
    info!(seed_id = seed.id, "posting seed question");

    let question = NewChatMessage::user(
        MessageId::new(),
        &seed.user_name,
        &seed.question_text,
        SourceId::auto_bot(),
    );
    ctx.messages().insert(&question)?;

    let answer = match ctx.assistant().bridge() {
        Some(bridge) => Some(bridge.ask(&seed.question_text, AUTOPOST_INSTRUCTIONS).await),
        None => None,
    };

    if let Err(e) = ctx.content().mark_sent(seed.id, Utc::now()) {
        warn!(seed_id = seed.id, error = %e, "failed to mark seed question sent");
    }

    let raw = match answer {
        None => {
            return Ok(AutoPostOutcome::PostedWithoutAssistant {
                question: seed.question_text,
                user_name: seed.user_name,
            })
        }
        Some(Err(e)) => {
            warn!(code = e.code(), error = %e, "assistant failed on seed question");
            return Err(PipelineError::Assistant(e));
        }
        Some(Ok(raw)) => raw,
    };

    let terms = TermSet::with_dynamic(load_terms(ctx));
    let processed = post_process(&raw, ctx.moderator(), &terms);
    let reply = NewChatMessage::assistant(
        &ctx.chat_config().bot_name,
        &processed.text,
        Some(question.id.clone()),
    );
    if let Err(e) = ctx.messages().insert(&reply) {
        warn!(error = %e, "failed to store seed answer");
    }

    Ok(AutoPostOutcome::Answered {
        question: seed.question_text,
        user_name: seed.user_name,
        response: processed.text,
    })
}
