//! Emoji detection and image substitution.
//!
//! Detection works on extended grapheme clusters, so ZWJ sequences, skin
//! tones, flags and keycaps come out as one match. Each match is replaced by
//! an `<img>` pointing at an SVG named after its code points.

use unicode_segmentation::UnicodeSegmentation;

pub const VS16: char = '\u{FE0F}';
pub const ZWJ: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';

#[derive(Debug, thiserror::Error)]
pub enum EmojiError {
    #[error("emoji match `{text}` at byte {index} does not line up with the input")]
    Misaligned { text: String, index: usize },
}

/// One emoji sequence found in a text run; `index` is a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiMatch {
    pub text: String,
    pub index: usize,
}

pub trait EmojiMatcher {
    /// Emoji sequences in `text`, in order and non-overlapping.
    fn find_emoji_sequences(&self, text: &str) -> Result<Vec<EmojiMatch>, EmojiError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GraphemeEmojiMatcher;

impl EmojiMatcher for GraphemeEmojiMatcher {
    fn find_emoji_sequences(&self, text: &str) -> Result<Vec<EmojiMatch>, EmojiError> {
        Ok(text
            .grapheme_indices(true)
            .filter(|(_, g)| is_emoji_grapheme(g))
            .map(|(index, g)| EmojiMatch {
                text: g.to_string(),
                index,
            })
            .collect())
    }
}

/// Whether a grapheme cluster renders as an emoji.
///
/// `©`, `®`, `™` and `♟` only count with an explicit VS16; digits, `#` and
/// `*` only as keycaps.
pub fn is_emoji_grapheme(grapheme: &str) -> bool {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    match first {
        '0'..='9' | '#' | '*' => grapheme.ends_with(KEYCAP),
        '\u{A9}' | '\u{AE}' | '\u{2122}' | '\u{265F}' => chars.next() == Some(VS16),
        c => is_pictographic(c),
    }
}

fn is_pictographic(c: char) -> bool {
    matches!(c as u32,
        0x203C | 0x2049 | 0x2139 | 0x2194..=0x2199 | 0x21A9..=0x21AA
        | 0x231A..=0x231B | 0x2328 | 0x23CF | 0x23E9..=0x23F3 | 0x23F8..=0x23FA
        | 0x24C2 | 0x25AA..=0x25AB | 0x25B6 | 0x25C0 | 0x25FB..=0x25FE
        | 0x2600..=0x2604 | 0x260E | 0x2611 | 0x2614..=0x2615 | 0x2618 | 0x261D
        | 0x2620 | 0x2622..=0x2623 | 0x2626 | 0x262A | 0x262E..=0x262F
        | 0x2638..=0x263A | 0x2640 | 0x2642 | 0x2648..=0x2653 | 0x2660 | 0x2663
        | 0x2665..=0x2666 | 0x2668 | 0x267B | 0x267E..=0x267F | 0x2692..=0x2697
        | 0x2699 | 0x269B..=0x269C | 0x26A0..=0x26A1 | 0x26A7 | 0x26AA..=0x26AB
        | 0x26B0..=0x26B1 | 0x26BD..=0x26BE | 0x26C4..=0x26C5 | 0x26C8
        | 0x26CE..=0x26CF | 0x26D1 | 0x26D3..=0x26D4 | 0x26E9..=0x26EA
        | 0x26F0..=0x26F5 | 0x26F7..=0x26FA | 0x26FD | 0x2702 | 0x2705
        | 0x2708..=0x270D | 0x270F | 0x2712 | 0x2714 | 0x2716 | 0x271D | 0x2721
        | 0x2728 | 0x2733..=0x2734 | 0x2744 | 0x2747 | 0x274C | 0x274E
        | 0x2753..=0x2755 | 0x2757 | 0x2763..=0x2764 | 0x2795..=0x2797 | 0x27A1
        | 0x27B0 | 0x27BF | 0x2934..=0x2935 | 0x2B05..=0x2B07 | 0x2B1B..=0x2B1C
        | 0x2B50 | 0x2B55 | 0x3030 | 0x303D | 0x3297 | 0x3299
        | 0x1F004 | 0x1F0CF | 0x1F170..=0x1F171 | 0x1F17E..=0x1F17F | 0x1F18E
        | 0x1F191..=0x1F19A | 0x1F1E6..=0x1F1FF | 0x1F201..=0x1F202 | 0x1F21A
        | 0x1F22F | 0x1F232..=0x1F23A | 0x1F250..=0x1F251 | 0x1F300..=0x1F64F
        | 0x1F680..=0x1F6FF | 0x1F7E0..=0x1F7EB | 0x1F7F0 | 0x1F90C..=0x1F9FF
        | 0x1FA70..=0x1FAFF)
}

/// Splits a scalar value into UTF-16 code units.
pub fn to_surrogates(code_point: u32) -> (u16, Option<u16>) {
    if code_point < 0x10000 {
        return (code_point as u16, None);
    }
    let offset = code_point - 0x10000;
    (
        (0xD800 + (offset >> 10)) as u16,
        Some((0xDC00 + (offset & 0x3FF)) as u16),
    )
}

/// Joins UTF-16 code units back into a scalar value.
pub fn from_surrogates(high: u16, low: Option<u16>) -> u32 {
    match low {
        Some(low) => 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00),
        None => u32::from(high),
    }
}

/// Lowercase hex code points of `raw`, joined by `sep` (`1f468-200d-1f469`).
pub fn to_code_point(raw: &str, sep: &str) -> String {
    let mut parts = Vec::new();
    let mut pending_high: Option<u16> = None;
    for unit in raw.encode_utf16() {
        if let Some(high) = pending_high.take() {
            parts.push(format!("{:x}", from_surrogates(high, Some(unit))));
        } else if (0xD800..=0xDBFF).contains(&unit) {
            pending_high = Some(unit);
        } else {
            parts.push(format!("{unit:x}"));
        }
    }
    parts.join(sep)
}

/// Inverse of [`to_code_point`] with `-` as separator.
pub fn from_code_point(code_points: &str) -> Option<String> {
    code_points
        .split('-')
        .map(|hex| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32))
        .collect()
}

/// Icon file stem for a raw sequence. VS16 is dropped unless the sequence
/// joins with ZWJ, matching how the icon set names its files.
pub fn icon_id(raw: &str) -> String {
    if raw.contains(ZWJ) {
        to_code_point(raw, "-")
    } else {
        to_code_point(&raw.replace(VS16, ""), "-")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiOptions {
    pub base: String,
    pub folder: String,
    pub ext: String,
    pub class_name: String,
}

impl Default for EmojiOptions {
    fn default() -> Self {
        Self {
            base: "https://abs-0.twimg.com/emoji/v2/".to_string(),
            folder: "svg".to_string(),
            ext: ".svg".to_string(),
            class_name: "emoji".to_string(),
        }
    }
}

impl EmojiOptions {
    pub fn image_src(&self, icon: &str) -> String {
        format!("{}{}/{}{}", self.base, self.folder, icon, self.ext)
    }
}

/// Extra `<img>` attributes for a raw sequence and its icon id.
pub type AttributeFn = fn(&str, &str) -> Vec<(String, String)>;

pub fn default_attributes(raw: &str, icon: &str) -> Vec<(String, String)> {
    vec![
        ("title".to_string(), format!("Emoji: {raw}{icon}")),
        (
            "style".to_string(),
            "height: 1em;width: 1em;margin: 0.05em 0.1em;vertical-align: -0.1em;".to_string(),
        ),
    ]
}

/// Replaces each match in `text` with an `<img>` tag.
pub fn substitute(
    text: &str,
    matches: &[EmojiMatch],
    options: &EmojiOptions,
    attributes: AttributeFn,
) -> Result<String, EmojiError> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for m in matches {
        let end = m.index.checked_add(m.text.len());
        let lines_up = m.index >= cursor
            && end.and_then(|end| text.get(m.index..end)) == Some(m.text.as_str());
        if m.text.is_empty() || !lines_up {
            return Err(EmojiError::Misaligned {
                text: m.text.clone(),
                index: m.index,
            });
        }
        out.push_str(&text[cursor..m.index]);
        out.push_str(&image_tag(&m.text, options, attributes));
        cursor = m.index + m.text.len();
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn image_tag(raw: &str, options: &EmojiOptions, attributes: AttributeFn) -> String {
    let icon = icon_id(raw);
    if icon.is_empty() {
        return raw.to_string();
    }
    let mut seen: Vec<String> = ["class", "draggable", "alt", "src"]
        .map(String::from)
        .to_vec();
    let mut tag = format!(
        r#"<img class="{}" draggable="false" alt="{}" src="{}""#,
        html_escape::encode_double_quoted_attribute(&options.class_name),
        html_escape::encode_double_quoted_attribute(raw),
        html_escape::encode_double_quoted_attribute(&options.image_src(&icon)),
    );
    let extra = attributes(raw, &icon);
    for (name, value) in &extra {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("on") || seen.contains(&lower) {
            continue;
        }
        tag.push_str(&format!(
            r#" {lower}="{}""#,
            html_escape::encode_double_quoted_attribute(value)
        ));
        seen.push(lower);
    }
    tag.push_str("/>");
    tag
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("😀", "1f600")]
    #[case("❤️", "2764")]
    #[case("👨‍👩‍👧", "1f468-200d-1f469-200d-1f467")]
    #[case("🏳️‍🌈", "1f3f3-fe0f-200d-1f308")]
    #[case("🇯🇵", "1f1ef-1f1f5")]
    #[case("1️⃣", "31-20e3")]
    #[case("👍🏽", "1f44d-1f3fd")]
    fn icon_ids(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(icon_id(raw), expected);
    }

    #[test]
    fn surrogates_round_trip_at_boundaries() {
        for cp in [0u32, 0xD7FF, 0xE000, 0xFFFF, 0x10000, 0x1F600, 0x10FFFF] {
            let (high, low) = to_surrogates(cp);
            assert_eq!(from_surrogates(high, low), cp, "code point {cp:x}");
        }
        assert_eq!(to_surrogates(0x1F600), (0xD83D, Some(0xDE00)));
    }

    #[test]
    fn code_point_strings_round_trip() {
        let raw = "👨‍👩‍👧";
        assert_eq!(from_code_point(&to_code_point(raw, "-")).as_deref(), Some(raw));
        assert_eq!(from_code_point("zz"), None);
    }

    #[rstest]
    #[case("hello 😀", true)]
    #[case("plain text", false)]
    #[case("© 2024", false)]
    #[case("©️ 2024", true)]
    #[case("room 1", false)]
    #[case("#️⃣", true)]
    #[case("★ not an emoji", false)]
    fn detection(#[case] text: &str, #[case] expected: bool) {
        let found = GraphemeEmojiMatcher.find_emoji_sequences(text).unwrap();
        assert_eq!(!found.is_empty(), expected);
    }

    #[test]
    fn zwj_sequence_is_one_match() {
        let found = GraphemeEmojiMatcher
            .find_emoji_sequences("a👨‍👩‍👧b")
            .unwrap();
        assert_eq!(
            found,
            vec![EmojiMatch {
                text: "👨‍👩‍👧".to_string(),
                index: 1
            }]
        );
    }

    #[test]
    fn substitutes_image_tags() {
        let text = "hi 😀!";
        let matches = GraphemeEmojiMatcher.find_emoji_sequences(text).unwrap();
        let html = substitute(text, &matches, &EmojiOptions::default(), |_, _| Vec::new()).unwrap();
        assert_eq!(
            html,
            r#"hi <img class="emoji" draggable="false" alt="😀" src="https://abs-0.twimg.com/emoji/v2/svg/1f600.svg"/>!"#
        );
    }

    #[test]
    fn event_handler_and_duplicate_attributes_are_skipped() {
        fn attrs(_: &str, _: &str) -> Vec<(String, String)> {
            vec![
                ("onload".to_string(), "x()".to_string()),
                ("src".to_string(), "evil".to_string()),
                ("title".to_string(), "a".to_string()),
                ("title".to_string(), "b".to_string()),
            ]
        }
        let matches = GraphemeEmojiMatcher.find_emoji_sequences("😀").unwrap();
        let html = substitute("😀", &matches, &EmojiOptions::default(), attrs).unwrap();
        assert!(!html.contains("onload"));
        assert!(!html.contains("evil"));
        assert_eq!(html.matches("title=").count(), 1);
        assert!(html.contains(r#"title="a""#));
    }

    #[test]
    fn misaligned_match_is_an_error() {
        let bad = [EmojiMatch {
            text: "😀".to_string(),
            index: 1,
        }];
        let err = substitute("ab😀", &bad, &EmojiOptions::default(), default_attributes).unwrap_err();
        assert!(matches!(err, EmojiError::Misaligned { index: 1, .. }));
    }
}
