use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Network origin of a message (client IP), or one of the sentinels below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    /// Assistant replies.
    pub const SYSTEM: &'static str = "system";
    /// Seed questions posted by the scheduler.
    pub const AUTO_BOT: &'static str = "auto-bot";
    /// Origin could not be resolved from the request.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn auto_bot() -> Self {
        Self(Self::AUTO_BOT.to_string())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty() || self.0 == Self::UNKNOWN
    }

    /// System-originated (assistant or scheduler), never a real client.
    pub fn is_automated(&self) -> bool {
        self.0 == Self::SYSTEM || self.0 == Self::AUTO_BOT
    }

    /// Sentinels can never appear in the block list.
    pub fn is_blockable(&self) -> bool {
        !self.is_unknown() && !self.is_automated()
    }

    /// Unknown origins fail open: they cannot be correlated across requests.
    pub fn is_rate_limited(&self) -> bool {
        !self.is_unknown() && !self.is_automated()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Chat message identifier. Caller-supplied or UUIDv7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
