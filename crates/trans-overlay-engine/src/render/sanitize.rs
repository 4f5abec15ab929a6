//! Allow-list HTML sanitizer.
//!
//! [`AllowListSanitizer`] adapts an [`AllowList`] to an [`ammonia::Builder`]:
//! tags and attributes off the list are stripped, URL attributes keep only
//! safe schemes, and `style` keeps only [`STYLE_PROPERTIES`]. Every retained
//! attribute value is then checked for script-bearing content. Output of
//! [`AllowListSanitizer`] is stable under a second pass.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use ammonia::UrlRelative;
use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("input is {len} bytes, over the {limit} byte sanitizer limit")]
    InputTooLarge { len: usize, limit: usize },
}

/// Typographic and box properties. Positioning, transforms, filters,
/// pointer/cursor and animation properties are deliberately absent.
pub const STYLE_PROPERTIES: &[&str] = &[
    "background",
    "background-attachment",
    "background-clip",
    "background-color",
    "background-image",
    "background-origin",
    "background-position",
    "background-repeat",
    "background-size",
    "border",
    "border-bottom",
    "border-bottom-color",
    "border-bottom-left-radius",
    "border-bottom-right-radius",
    "border-bottom-style",
    "border-bottom-width",
    "border-collapse",
    "border-color",
    "border-image",
    "border-image-outset",
    "border-image-repeat",
    "border-image-slice",
    "border-image-source",
    "border-image-width",
    "border-left",
    "border-left-color",
    "border-left-style",
    "border-left-width",
    "border-radius",
    "border-right",
    "border-right-color",
    "border-right-style",
    "border-right-width",
    "border-spacing",
    "border-style",
    "border-top",
    "border-top-color",
    "border-top-left-radius",
    "border-top-right-radius",
    "border-top-style",
    "border-top-width",
    "border-width",
    "box-decoration-break",
    "box-shadow",
    "box-sizing",
    "break-after",
    "break-before",
    "break-inside",
    "clear",
    "color",
    "display",
    "font",
    "font-family",
    "font-feature-settings",
    "font-kerning",
    "font-language-override",
    "font-size",
    "font-size-adjust",
    "font-stretch",
    "font-style",
    "font-synthesis",
    "font-variant",
    "font-variant-alternates",
    "font-variant-caps",
    "font-variant-east-asian",
    "font-variant-ligatures",
    "font-variant-numeric",
    "font-variant-position",
    "font-weight",
    "height",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-image",
    "list-style-position",
    "list-style-type",
    "margin",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "margin-top",
    "max-height",
    "max-width",
    "min-height",
    "min-width",
    "padding",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "padding-top",
    "text-align",
    "text-align-last",
    "text-combine-upright",
    "text-decoration",
    "text-decoration-color",
    "text-decoration-line",
    "text-decoration-skip",
    "text-decoration-style",
    "text-emphasis",
    "text-emphasis-color",
    "text-emphasis-position",
    "text-emphasis-style",
    "text-indent",
    "text-justify",
    "text-orientation",
    "text-overflow",
    "text-shadow",
    "text-transform",
    "text-underline-position",
    "text-wrap",
    "vertical-align",
    "width",
    "word-break",
    "word-spacing",
    "word-wrap",
];

/// Absolute URL schemes allowed in `href` and `src`. Relative URLs pass.
pub const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto", "tel", "data"];

/// Tags whose content is dropped along with the tag.
const CONTENT_TAGS: [&str; 2] = ["script", "style"];

/// Tag name to permitted attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    tags: BTreeMap<String, Vec<String>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, tag: &str, attributes: &[&str]) -> Self {
        self.tags.insert(
            tag.to_ascii_lowercase(),
            attributes.iter().map(|a| a.to_ascii_lowercase()).collect(),
        );
        self
    }

    /// Tags a translation overlay may contain.
    pub fn overlay_default() -> Self {
        let mut list = Self::new()
            .allow("img", &["src", "alt", "title", "width", "height", "style"]);
        for tag in ["a", "div", "hr", "span", "ul", "ol", "li", "p"] {
            list = list.allow(tag, &["style"]);
        }
        for tag in [
            "code", "em", "h1", "h2", "h3", "h4", "h5", "h6", "i", "small", "sub", "sup",
            "strong", "strike", "pre",
        ] {
            list = list.allow(tag, &[]);
        }
        list
    }

    pub fn is_allowed_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    fn builder(&self) -> ammonia::Builder<'_> {
        let tags: HashSet<&str> = self.tags.keys().map(String::as_str).collect();
        let tag_attributes: HashMap<&str, HashSet<&str>> = self
            .tags
            .iter()
            .map(|(tag, attrs)| (tag.as_str(), attrs.iter().map(String::as_str).collect()))
            .collect();
        // ammonia refuses a tag that is both kept and content-cleaned
        let content_tags: HashSet<&str> = CONTENT_TAGS
            .into_iter()
            .filter(|tag| !self.is_allowed_tag(tag))
            .collect();

        let mut builder = ammonia::Builder::empty();
        builder
            .tags(tags)
            .tag_attributes(tag_attributes)
            .clean_content_tags(content_tags)
            .url_schemes(URL_SCHEMES.iter().copied().collect())
            .url_relative(UrlRelative::PassThrough)
            .link_rel(None)
            .strip_comments(true)
            .filter_style_properties(STYLE_PROPERTIES.iter().copied().collect())
            .attribute_filter(filter_attribute);
        builder
    }
}

/// Strips markup not on an [`AllowList`].
pub trait Sanitizer {
    fn sanitize(&self, html: &str, allowed: &AllowList) -> Result<String, SanitizeError>;
}

#[derive(Debug, Clone, Copy)]
pub struct AllowListSanitizer {
    max_input_len: usize,
}

impl AllowListSanitizer {
    pub fn new(max_input_len: usize) -> Self {
        Self { max_input_len }
    }
}

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str, allowed: &AllowList) -> Result<String, SanitizeError> {
        if html.len() > self.max_input_len {
            return Err(SanitizeError::InputTooLarge {
                len: html.len(),
                limit: self.max_input_len,
            });
        }
        Ok(allowed.builder().clean(html).to_string())
    }
}

fn script_content() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:java|vb|live)script:|mocha:|expression\(|data:text/html")
            .expect("Invalid script content regex")
    })
}

fn encoded_punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)&(colon|newline);?").expect("Invalid entity regex"))
}

/// The value as a browser would act on it: entities decoded, whitespace and
/// control characters removed.
fn compact_value(value: &str) -> String {
    let value = encoded_punctuation().replace_all(value, |caps: &regex::Captures<'_>| {
        if caps[1].eq_ignore_ascii_case("colon") { ":" } else { " " }
    });
    html_escape::decode_html_entities(&value)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect()
}

/// Drops any attribute whose value could run script. `data:` URLs must be images.
fn filter_attribute<'u>(element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    let compact = compact_value(value).to_ascii_lowercase();
    let rejected = script_content().is_match(&compact)
        || (matches!(attribute, "href" | "src")
            && compact.starts_with("data:")
            && !compact.starts_with("data:image/"));
    if rejected {
        log::debug!("dropping {element} {attribute}=\"{value}\"");
        return None;
    }
    Some(Cow::Borrowed(value))
}
