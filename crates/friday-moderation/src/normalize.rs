//! Text folding shared by every check.
//!
//! Checks run against several views of the same input so that spacing and
//! punctuation tricks ("w w w . x . c o m", "050-123-4567") collapse back
//! into something the patterns recognise.

const ZERO_WIDTH: [char; 5] = ['\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}', '\u{feff}'];

/// Lowercased, zero-width characters removed, whitespace runs collapsed to
/// a single space and trimmed.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars().filter(|c| !ZERO_WIDTH.contains(c)) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// [`fold`] with all whitespace removed; punctuation is kept.
pub fn squash(text: &str) -> String {
    fold(text).chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '_' | '.' | '(' | ')' | '[' | ']' | '/' | '\\')
}

/// [`fold`] with whitespace and the usual separator punctuation removed.
pub fn clean(text: &str) -> String {
    fold(text).chars().filter(|c| !is_separator(*c)).collect()
}

pub fn digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}
