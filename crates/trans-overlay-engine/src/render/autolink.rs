//! Link highlighting and line wrapping for sanitized text.

use std::sync::OnceLock;

use regex::Regex;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:https?|ftp|file)://[-A-Za-z0-9+&@#/%?=~_|!:,.;]*[-A-Za-z0-9+&@#/%=~_|]")
            .expect("Invalid URL regex")
    })
}

fn hashtag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[^\s#!0-9]\S*").expect("Invalid hashtag regex"))
}

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@[A-Za-z0-9_]{4,15}").expect("Invalid mention regex"))
}

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^\n]+)\n").expect("Invalid line regex"))
}

/// Wraps URLs, hashtags and mentions in `text` with an accent-coloured `<a>`.
///
/// `text` must be a run of text with no tags in it. URLs win over hashtags
/// and mentions that overlap them. A `#` right after `&` opens a character
/// reference, not a hashtag.
pub fn autolink(text: &str, accent_color: &str) -> String {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for re in [url_regex(), mention_regex()] {
        spans.extend(re.find_iter(text).map(|m| (m.start(), m.end())));
    }
    spans.extend(
        hashtag_regex()
            .find_iter(text)
            .filter(|m| !text[..m.start()].ends_with('&'))
            .map(|m| (m.start(), m.end())),
    );
    // Earlier start first; on ties the longer span
    spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in spans {
        if start < cursor {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&format!(
            r#"<a style="color:{accent_color};">{}</a>"#,
            &text[start..end]
        ));
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Each non-empty line ending in a newline becomes `<p>line</p>`; any
/// remaining newline becomes `<br>` plus the newline.
pub fn wrap_lines(html: &str) -> String {
    let wrapped = line_regex().replace_all(html, "<p>$1</p>");
    wrapped.replace('\n', "<br>\n")
}
