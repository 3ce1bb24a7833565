//! Contact-information leakage: URLs, Israeli phone numbers, emails.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::{digits, fold, squash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Url,
    Phone,
    Email,
}

/// Suffixes treated as a domain when they follow `name.`.
pub const DOMAIN_SUFFIXES: &[&str] = &[
    "com", "co.il", "net", "org", "io", "gov", "edu", "info", "biz", "tv", "me", "cc", "xyz",
    "online", "site", "website", "store", "shop", "blog", "app", "dev",
];

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://").expect("valid regex"));

static WWW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"www[.\-_]").expect("valid regex"));

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    let suffixes = DOMAIN_SUFFIXES
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"[a-z0-9]+[.\-_](?:{suffixes})(?:[^a-z0-9]|$)")).expect("valid regex")
});

/// `shop com`, `ynet co il`: a plain space standing in for the dot. Only
/// suffixes that never occur as ordinary words qualify.
static SPACED_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9]{2,} (?:com|net|org|co[ .]il)(?:[^a-z0-9]|$)").expect("valid regex")
});

/// A digit run that may be broken up by whitespace or separator punctuation
/// (`-` `.` `_` `/` `\` `*` and brackets).
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\d[\d\s\-._/\\*()\[\]]{6,}\d").expect("valid regex")
});

static SPACED_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"0[2-9]\s*[\-.]?\s*\d{7,8}|05\d\s*[\-.]?\s*\d{7}").expect("valid regex")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}").expect("valid regex")
});

static DOMAIN_AFTER_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+\.[a-z]{2,}").expect("valid regex"));

/// First kind of contact information found. Emails are checked before URLs
/// since every address also contains a domain.
pub fn find_contact(text: &str) -> Option<ContactKind> {
    if has_email(text) {
        Some(ContactKind::Email)
    } else if has_url(text) {
        Some(ContactKind::Url)
    } else if has_phone(text) {
        Some(ContactKind::Phone)
    } else {
        None
    }
}

pub fn has_url(text: &str) -> bool {
    let folded = fold(text);
    let squashed = squash(text);
    SCHEME.is_match(&squashed)
        || WWW.is_match(&squashed)
        || DOMAIN.is_match(&folded)
        || DOMAIN.is_match(&squashed)
        || SPACED_DOMAIN.is_match(&folded)
}

/// Landline `0[2-9]` + 7/8 digits, mobile `05x` + 7 digits, or the same
/// behind a `972` country code.
fn is_phone_digits(d: &str) -> bool {
    let n = d.len();
    let local = (n == 9 || n == 10)
        && d.starts_with('0')
        && d.as_bytes().get(1).is_some_and(|b| (b'2'..=b'9').contains(b));
    let international = d.starts_with("972") && (n == 12 || n == 13);
    local || international
}

pub fn has_phone(text: &str) -> bool {
    let folded = fold(text);
    if DIGIT_RUN
        .find_iter(&folded)
        .any(|m| is_phone_digits(&digits(m.as_str())))
    {
        return true;
    }
    // Whole-message fallback for digits scattered among other characters.
    let all = digits(&folded);
    (all.len() == 9 || all.len() == 10) && SPACED_PHONE.is_match(&folded)
}

pub fn has_email(text: &str) -> bool {
    let squashed = squash(text);
    if EMAIL.is_match(&squashed) {
        return true;
    }
    squashed
        .split_once('@')
        .is_some_and(|(_, after)| DOMAIN_AFTER_AT.is_match(after))
}
