//! Banned and competitor term matching.

use crate::normalize::{clean, fold};

/// Always-banned terms, merged with the admin-managed list at evaluation time.
pub const BASELINE_TERMS: &[&str] = &["קללה", "מתחרה"];

/// Competitor names. Matches here get their own rejection reason.
pub const COMPETITORS: &[&str] = &[
    "סופר פארם",
    "שופרסל",
    "ויקטורי",
    "איקאה",
    "רמי לוי",
    "מגה",
    "אושר עד",
];

/// Shorter terms are skipped; they match inside too many ordinary words.
pub const MIN_TERM_CHARS: usize = 3;

/// Single-letter Hebrew prefixes (and, the, in, as, to, from, that) that attach
/// directly to the following word.
const HEBREW_PREFIXES: &[char] = &['ו', 'ה', 'ב', 'כ', 'ל', 'מ', 'ש'];
const MAX_PREFIX_LETTERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Competitor,
    Banned,
}

#[derive(Debug, Clone)]
struct Term {
    folded: String,
    cleaned: String,
    kind: TermKind,
}

/// Union of competitors, baseline terms and any dynamic terms, pre-folded.
#[derive(Debug, Clone)]
pub struct TermSet {
    terms: Vec<Term>,
}

impl Default for TermSet {
    fn default() -> Self {
        Self::baseline()
    }
}

impl TermSet {
    /// Competitors plus the baseline list.
    pub fn baseline() -> Self {
        Self::with_dynamic(std::iter::empty::<&str>())
    }

    /// Baseline merged with `dynamic` (the admin-managed forbidden words).
    pub fn with_dynamic<I, S>(dynamic: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self { terms: Vec::new() };
        for t in COMPETITORS {
            set.push(t, TermKind::Competitor);
        }
        for t in BASELINE_TERMS {
            set.push(t, TermKind::Banned);
        }
        for t in dynamic {
            set.push(t.as_ref(), TermKind::Banned);
        }
        set
    }

    fn push(&mut self, raw: &str, kind: TermKind) {
        let folded = fold(raw);
        let cleaned = clean(raw);
        if folded.chars().count() < MIN_TERM_CHARS || cleaned.chars().count() < MIN_TERM_CHARS {
            return;
        }
        if self.terms.iter().any(|t| t.folded == folded) {
            return;
        }
        self.terms.push(Term {
            folded,
            cleaned,
            kind,
        });
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// First term found in `text` as a whole word. Competitors are checked
    /// before everything else.
    pub fn find(&self, text: &str) -> Option<(TermKind, &str)> {
        let folded = fold(text);
        let cleaned = clean(text);
        self.terms
            .iter()
            .find(|t| contains_whole_word(&folded, &t.folded) || cleaned == t.cleaned)
            .map(|t| (t.kind, t.folded.as_str()))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Whole-word containment. Unicode-aware, so it works for Hebrew where
/// ASCII `\b` does not, and tolerates attached Hebrew prefixes.
pub fn contains_whole_word(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        boundary_before(&haystack[..start]) && boundary_after(&haystack[start + term.len()..])
    })
}

fn boundary_before(before: &str) -> bool {
    let attached: Vec<char> = before.chars().rev().take_while(|c| is_word_char(*c)).collect();
    attached.len() <= MAX_PREFIX_LETTERS && attached.iter().all(|c| HEBREW_PREFIXES.contains(c))
}

fn boundary_after(after: &str) -> bool {
    after.chars().next().map_or(true, |c| !is_word_char(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_word_only() {
        assert!(contains_whole_word("קניתי במגה אתמול", "מגה"));
        assert!(contains_whole_word("מגה!", "מגה"));
        assert!(!contains_whole_word("קניתי מגהץ חדש", "מגה"));
        assert!(!contains_whole_word("megastore", "mega"));
        assert!(contains_whole_word("go to mega now", "mega"));
    }

    #[test]
    fn attached_prefixes_are_tolerated() {
        assert!(contains_whole_word("בואו לסופר פארם", "סופר פארם"));
        assert!(contains_whole_word("ובשופרסל יש", "שופרסל"));
        // Three attached letters is a different word.
        assert!(!contains_whole_word("כשבשופרסל", "שופרסל"));
    }

    #[test]
    fn short_terms_are_skipped() {
        let set = TermSet::with_dynamic(["ab", "  ", "x y"]);
        assert_eq!(set.len(), TermSet::baseline().len());
    }

    #[test]
    fn competitors_win_over_banned() {
        let set = TermSet::with_dynamic(["שופרסל", "אסור"]);
        assert_eq!(set.find("מה עם שופרסל").map(|(k, _)| k), Some(TermKind::Competitor));
        assert_eq!(set.find("זה אסור").map(|(k, _)| k), Some(TermKind::Banned));
        assert_eq!(set.find("מה המחיר?"), None);
    }

    #[test]
    fn spaced_out_term_matches_when_it_is_the_whole_message() {
        let set = TermSet::baseline();
        assert_eq!(set.find("ש-ו-פ-ר-ס-ל").map(|(k, _)| k), Some(TermKind::Competitor));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let set = TermSet::with_dynamic(["BadWord"]);
        assert!(set.find("this has a BADWORD in it").is_some());
        assert!(set.find("badwordish").is_none());
    }
}
