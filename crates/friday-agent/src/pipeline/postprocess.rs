//! Reply clean-up between the assistant and the message store.

use std::sync::LazyLock;

use friday_moderation::{Moderator, Reason, TermSet, Verdict};
use regex::Regex;

pub const MAX_REPLY_CHARS: usize = 300;

/// Sent instead of a reply that failed moderation.
pub const REDIRECT_MESSAGE: &str =
    "אני כאן לעזור רק עם שאלות על Yellow Friday ומחסני השוק. איך אוכל לעזור לך?";

/// Sent instead of a reply that named a specific discount.
pub const TEASER_MESSAGE: &str = "יש לנו מבצעים מדהימים על כל הקטגוריות! המבצעים המדויקים ייחשפו ב-Yellow Friday. הצטרפו לקבוצת הוואטסאפ הסודית לקבלת גישה מוקדמת!";

const HONORIFIC: &str = "חבר/ה";

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s").expect("valid regex"));

/// Greeting followed by one bare Hebrew word (the user's name, usually).
/// [`strip_names`] checks what follows the name without consuming it.
static GREETING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\p{L}\p{N}])(היי|שלום|תודה)\s+([א-ת]+)").expect("valid regex")
});

static DEAL_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"\d+%").expect("valid regex"),
        Regex::new(r"מבצע.*\d+").expect("valid regex"),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// Possibly shortened or de-personalised, otherwise the assistant's text.
    Kept,
    /// Failed outbound moderation; replaced by [`REDIRECT_MESSAGE`].
    Redirected(Reason),
    /// Leaked a specific offer; replaced by [`TEASER_MESSAGE`].
    Teaser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub text: String,
    pub outcome: PostOutcome,
}

/// Cap at [`MAX_REPLY_CHARS`], preferring the first sentence when it fits.
pub fn truncate(reply: &str) -> String {
    if reply.chars().count() <= MAX_REPLY_CHARS {
        return reply.to_string();
    }
    let first = SENTENCE_END.split(reply).next().unwrap_or_default();
    if !first.is_empty() && first.chars().count() <= MAX_REPLY_CHARS {
        return format!("{first}.");
    }
    let head: String = reply.chars().take(MAX_REPLY_CHARS - 3).collect();
    format!("{head}...")
}

/// "שלום דנה," becomes "שלום חבר/ה,".
pub fn strip_names(reply: &str) -> String {
    let mut out = String::with_capacity(reply.len());
    let mut copied = 0;
    for caps in GREETING_NAME.captures_iter(reply) {
        let (Some(greeting), Some(name)) = (caps.get(2), caps.get(3)) else {
            continue;
        };
        let word_ends = reply[name.end()..]
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || matches!(c, ',' | '!' | '.'));
        if !word_ends {
            continue;
        }
        out.push_str(&reply[copied..greeting.end()]);
        out.push(' ');
        out.push_str(HONORIFIC);
        copied = name.end();
    }
    out.push_str(&reply[copied..]);
    out
}

pub fn mentions_specific_deal(reply: &str) -> bool {
    DEAL_PATTERNS.iter().any(|p| p.is_match(reply))
}

/// Truncate, strip names, re-moderate, then redact specific offers.
pub fn post_process(raw: &str, moderator: &dyn Moderator, terms: &TermSet) -> Processed {
    let text = strip_names(&truncate(raw));

    if let Verdict::Rejected(reason) = moderator.classify(&text, terms) {
        return Processed {
            text: REDIRECT_MESSAGE.to_string(),
            outcome: PostOutcome::Redirected(reason),
        };
    }

    if mentions_specific_deal(&text) {
        return Processed {
            text: TEASER_MESSAGE.to_string(),
            outcome: PostOutcome::Teaser,
        };
    }

    Processed {
        text,
        outcome: PostOutcome::Kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use friday_moderation::PatternModerator;

    fn run(raw: &str) -> Processed {
        post_process(raw, &PatternModerator, &TermSet::baseline())
    }

    #[test]
    fn short_reply_passes_through() {
        let p = run("Yellow Friday מחכה לך! 🎉");
        assert_eq!(p.text, "Yellow Friday מחכה לך! 🎉");
        assert_eq!(p.outcome, PostOutcome::Kept);
    }

    #[test]
    fn long_reply_cut_at_first_sentence() {
        let raw = format!("משפט ראשון קצר! {}", "מילה ".repeat(80));
        assert_eq!(truncate(&raw), "משפט ראשון קצר.");
    }

    #[test]
    fn long_reply_without_boundary_is_hard_cut() {
        let raw = "א".repeat(400);
        let out = truncate(&raw);
        assert_eq!(out.chars().count(), 300);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn reply_at_exactly_the_cap_is_untouched() {
        let at_cap = "א".repeat(MAX_REPLY_CHARS);
        assert_eq!(truncate(&at_cap), at_cap);

        let over = "א".repeat(MAX_REPLY_CHARS + 1);
        let out = truncate(&over);
        assert_eq!(out.chars().count(), MAX_REPLY_CHARS);
        assert_eq!(out, format!("{}...", "א".repeat(MAX_REPLY_CHARS - 3)));
    }

    #[test]
    fn greeting_names_are_replaced() {
        assert_eq!(strip_names("שלום דנה, מחכים לך!"), "שלום חבר/ה, מחכים לך!");
        assert_eq!(strip_names("היי יוסי! בוא ביום שישי"), "היי חבר/ה! בוא ביום שישי");
        assert_eq!(strip_names("שלום חבר/ה, מחכים"), "שלום חבר/ה, מחכים");
        assert_eq!(strip_names("בלי ברכה בכלל"), "בלי ברכה בכלל");
    }

    #[test]
    fn back_to_back_greetings_are_both_replaced() {
        assert_eq!(
            strip_names("שלום דנה שלום יוסי, בואו"),
            "שלום חבר/ה שלום חבר/ה, בואו"
        );
        assert_eq!(strip_names("היי רון. תודה מיכל!"), "היי חבר/ה. תודה חבר/ה!");
    }

    #[test]
    fn percentage_becomes_teaser() {
        let p = run("יש לנו 50% הנחה על הכל!");
        assert_eq!(p.text, TEASER_MESSAGE);
        assert_eq!(p.outcome, PostOutcome::Teaser);
        assert!(mentions_specific_deal("מבצע 1+1 על כל המדפים"));
    }

    #[test]
    fn competitor_in_reply_is_redirected() {
        let p = run("אפשר גם לקפוץ לשופרסל");
        assert_eq!(p.text, REDIRECT_MESSAGE);
        assert_eq!(p.outcome, PostOutcome::Redirected(Reason::Competitor));
    }
}
