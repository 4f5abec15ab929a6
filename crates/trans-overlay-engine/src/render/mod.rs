//! # Rich Text Rendering
//!
//! Turns a translator-supplied fragment into HTML that is safe to inject
//! into a tweet page.
//!
//! ## Pipeline
//!
//! 1. **Sanitize** against the overlay [`AllowList`]
//! 2. **Autolink** URLs, hashtags and mentions in text runs
//! 3. **Wrap lines** into `<p>` / `<br>`
//! 4. **Resolve escapes** (`\#` becomes `#`)
//! 5. **Substitute emoji** in text runs with `<img>` tags
//!
//! The sanitizer and emoji matcher are traits so callers can swap them; any
//! failure in the pipeline falls back to the HTML-escaped input.

pub mod autolink;
pub mod emoji;
pub mod sanitize;

use std::sync::OnceLock;

use regex::Regex;

pub use emoji::{
    AttributeFn, EmojiError, EmojiMatch, EmojiMatcher, EmojiOptions, GraphemeEmojiMatcher,
};
pub use sanitize::{AllowList, AllowListSanitizer, SanitizeError, Sanitizer};

use crate::escape;

pub const DEFAULT_ACCENT_COLOR: &str = "#1DA1F2";
pub const DEFAULT_MAX_INPUT_LEN: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("sanitizing failed: {0}")]
    Sanitize(#[from] SanitizeError),
    #[error("emoji substitution failed: {0}")]
    Emoji(#[from] EmojiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Colour used for linked URLs, hashtags and mentions.
    pub accent_color: String,
    /// Inputs longer than this many bytes are not rendered as HTML.
    pub max_input_len: usize,
    pub emoji: EmojiOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            emoji: EmojiOptions::default(),
        }
    }
}

pub struct RichTextRenderer<S = AllowListSanitizer, M = GraphemeEmojiMatcher> {
    options: RenderOptions,
    allow_list: AllowList,
    sanitizer: S,
    matcher: M,
    attributes: AttributeFn,
}

impl RichTextRenderer {
    pub fn new(options: RenderOptions) -> Self {
        let sanitizer = AllowListSanitizer::new(options.max_input_len);
        Self::with_collaborators(options, sanitizer, GraphemeEmojiMatcher)
    }
}

impl Default for RichTextRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl<S: Sanitizer, M: EmojiMatcher> RichTextRenderer<S, M> {
    pub fn with_collaborators(options: RenderOptions, sanitizer: S, matcher: M) -> Self {
        Self {
            options,
            allow_list: AllowList::overlay_default(),
            sanitizer,
            matcher,
            attributes: emoji::default_attributes,
        }
    }

    /// Replaces the function that supplies extra emoji `<img>` attributes.
    pub fn with_attributes(mut self, attributes: AttributeFn) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders `text`, falling back to escaped plain text on any failure.
    pub fn render(&self, text: &str) -> String {
        match self.try_render(text) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Rendering failed, falling back to plain text: {e}");
                escape_plain(text)
            }
        }
    }

    pub fn try_render(&self, text: &str) -> Result<String, RenderError> {
        let sanitized = self.sanitizer.sanitize(text, &self.allow_list)?;
        let protected = escape::protect(&sanitized);
        let linked = map_text_runs(&protected, |run| {
            Ok::<_, RenderError>(autolink::autolink(run, &self.options.accent_color))
        })?;
        let wrapped = autolink::wrap_lines(&linked);
        let restored = escape::restore_literal(&wrapped);
        map_text_runs(&restored, |run| self.substitute_emoji(run))
    }

    /// True when the configured matcher finds an emoji in `text`.
    pub fn looks_like_emoji(&self, text: &str) -> bool {
        self.matcher
            .find_emoji_sequences(text)
            .is_ok_and(|found| !found.is_empty())
    }

    fn substitute_emoji(&self, run: &str) -> Result<String, RenderError> {
        let matches = self.matcher.find_emoji_sequences(run)?;
        if matches.is_empty() {
            return Ok(run.to_string());
        }
        Ok(emoji::substitute(
            run,
            &matches,
            &self.options.emoji,
            self.attributes,
        )?)
    }
}

/// Escapes everything with markup meaning, quotes included.
pub fn escape_plain(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// A serialized tag. Attribute values are always double-quoted and may
/// contain `>`.
fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<(?:[^>"]|"[^"]*")*>"#).expect("Invalid tag regex"))
}

/// Applies `f` to the text between tags, copying tags through unchanged.
fn map_text_runs<E>(
    html: &str,
    mut f: impl FnMut(&str) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for tag in tag_regex().find_iter(html) {
        if tag.start() > cursor {
            out.push_str(&f(&html[cursor..tag.start()])?);
        }
        out.push_str(tag.as_str());
        cursor = tag.end();
    }
    if cursor < html.len() {
        out.push_str(&f(&html[cursor..])?);
    }
    Ok(out)
}
