//! Display-name hygiene for chat participants.

use thiserror::Error;

pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 20;

/// Profanity that may not appear anywhere inside a display name.
pub const NAME_BLOCKLIST: &[&str] = &["קללה", "מחורבן", "זין", "כוס", "פאק", "שיט"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("השם חייב להכיל לפחות 2 תווים")]
    TooShort,

    #[error("השם ארוך מדי (מקסימום 20 תווים)")]
    TooLong,

    #[error("השם חייב להכיל אותיות עבריות בלבד")]
    NotHebrew,

    #[error("השם מכיל מילה אסורה")]
    Forbidden,
}

fn is_hebrew_or_space(c: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&c) || c.is_whitespace()
}

/// Validate a display name and return it trimmed.
///
/// `extra` is the admin-managed forbidden list; unlike message text, names
/// are matched by plain containment.
pub fn validate_display_name<S: AsRef<str>>(name: &str, extra: &[S]) -> Result<String, NameError> {
    let name = name.trim();
    let len = name.chars().count();
    if len < MIN_NAME_CHARS {
        return Err(NameError::TooShort);
    }
    if len > MAX_NAME_CHARS {
        return Err(NameError::TooLong);
    }
    if !name.chars().all(is_hebrew_or_space) {
        return Err(NameError::NotHebrew);
    }
    let lower = name.to_lowercase();
    let forbidden = NAME_BLOCKLIST
        .iter()
        .copied()
        .chain(extra.iter().map(|s| s.as_ref().trim()))
        .filter(|w| !w.is_empty());
    for word in forbidden {
        if lower.contains(&word.to_lowercase()) {
            return Err(NameError::Forbidden);
        }
    }
    Ok(name.to_string())
}
