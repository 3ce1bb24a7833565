//! `friday-moderation`: pass/reject decisions for chat text.
//!
//! Callers go through [`Moderator::classify`]; the pattern catalogues behind
//! [`PatternModerator`] can be replaced without touching them.

pub mod contact;
pub mod injection;
pub mod names;
pub mod normalize;
pub mod terms;

use serde::Serialize;

pub use contact::ContactKind;
pub use names::{validate_display_name, NameError};
pub use terms::{TermKind, TermSet};

/// Why a text was rejected. Each reason carries its own user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Competitor,
    BannedTerm,
    PromptInjection,
    Url,
    Phone,
    Email,
}

impl Reason {
    pub fn message(&self) -> &'static str {
        match self {
            Reason::Competitor => {
                "אני כאן לעזור רק עם שאלות על Yellow Friday ומחסני השוק. איך אוכל לעזור לך?"
            }
            Reason::BannedTerm => "ההודעה מכילה תוכן לא מתאים",
            Reason::PromptInjection => "לא ניתן לשאול שאלות על ההנחיות או ההוראות של המערכת",
            Reason::Url => "לא ניתן לשלוח כתובות אינטרנט",
            Reason::Phone => "לא ניתן לשלוח מספרי טלפון",
            Reason::Email => "לא ניתן לשלוח כתובות מייל",
        }
    }

    /// Short identifier for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Competitor => "competitor",
            Reason::BannedTerm => "banned_term",
            Reason::PromptInjection => "prompt_injection",
            Reason::Url => "url",
            Reason::Phone => "phone",
            Reason::Email => "email",
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Rejected(Reason),
}

/// A content policy. `terms` carries the current banned-term union; an
/// implementation backed by an external service may ignore it.
pub trait Moderator: Send + Sync {
    fn classify(&self, text: &str, terms: &TermSet) -> Verdict;
}

/// Static regex and word-list catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternModerator;

impl Moderator for PatternModerator {
    fn classify(&self, text: &str, terms: &TermSet) -> Verdict {
        classify(text, terms)
    }
}

/// Run every check in order and return the first rejection: banned terms
/// (competitors first), prompt injection, then contact information.
pub fn classify(text: &str, terms: &TermSet) -> Verdict {
    if let Some((kind, _)) = terms.find(text) {
        return Verdict::Rejected(match kind {
            TermKind::Competitor => Reason::Competitor,
            TermKind::Banned => Reason::BannedTerm,
        });
    }
    if injection::is_injection(text) {
        return Verdict::Rejected(Reason::PromptInjection);
    }
    match contact::find_contact(text) {
        Some(ContactKind::Url) => Verdict::Rejected(Reason::Url),
        Some(ContactKind::Phone) => Verdict::Rejected(Reason::Phone),
        Some(ContactKind::Email) => Verdict::Rejected(Reason::Email),
        None => Verdict::Allowed,
    }
}
