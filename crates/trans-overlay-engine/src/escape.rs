//! Backslash escapes for the characters that carry markup meaning.
//!
//! `\#`, `\@` and `\\` are swapped for private-use placeholders while marker
//! matching or autolinking runs, then restored. The placeholders are
//! non-whitespace so they never split a token. Placeholder characters already
//! present in the input are prefixed with U+E003 and come back unchanged.

const BACKSLASH: char = '\u{E000}';
const HASH: char = '\u{E001}';
const AT: char = '\u{E002}';
const LITERAL: char = '\u{E003}';

fn is_reserved(c: char) -> bool {
    matches!(c, BACKSLASH | HASH | AT | LITERAL)
}

/// Replaces `\\`, `\#` and `\@` with placeholders, left to right.
pub fn protect(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if is_reserved(c) {
            out.push(LITERAL);
            out.push(c);
            continue;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let placeholder = match chars.peek() {
            Some('\\') => BACKSLASH,
            Some('#') => HASH,
            Some('@') => AT,
            _ => {
                out.push(c);
                continue;
            }
        };
        chars.next();
        out.push(placeholder);
    }
    out
}

/// Puts the escape sequences back (`\#` stays `\#`).
pub fn restore_escaped(s: &str) -> String {
    restore(s, |c| match c {
        BACKSLASH => Some("\\\\"),
        HASH => Some("\\#"),
        AT => Some("\\@"),
        _ => None,
    })
}

/// Resolves placeholders to the literal characters (`\#` becomes `#`).
pub fn restore_literal(s: &str) -> String {
    restore(s, |c| match c {
        BACKSLASH => Some("\\"),
        HASH => Some("#"),
        AT => Some("@"),
        _ => None,
    })
}

fn restore(s: &str, map: impl Fn(char) -> Option<&'static str>) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == LITERAL {
            out.push(chars.next().unwrap_or(LITERAL));
            continue;
        }
        match map(c) {
            Some(rep) => out.push_str(rep),
            None => out.push(c),
        }
    }
    out
}
