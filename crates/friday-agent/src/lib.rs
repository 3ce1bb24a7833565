//! `friday-agent` runs the chat pipeline: rate limiting, block list, moderation,
//! the assistant bridge and reply post-processing.

pub mod bridge;
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod provider;

pub use bridge::{AssistantBridge, AssistantSlot};
pub use provider::{ApiError, AssistantApi, AssistantError, Run, RunStatus, ThreadMessage};
