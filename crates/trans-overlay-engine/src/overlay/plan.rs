use serde::Serialize;

use super::layout::PostLayout;
use crate::render::{EmojiMatcher, RichTextRenderer, Sanitizer};
use crate::shorthand::{AnnotationSet, Level, LevelKey};

/// Prepended to a translation shown beside, not over, its source text.
pub const SEPARATOR: &str = "<p>--------</p>";

/// Applied to `<p>` elements in text and badge injections that carry no
/// style of their own.
pub const PARAGRAPH_STYLE: &str = "margin-bottom: 0px;margin-left: 0px;margin-right: 0px;margin-top: 0px;padding-bottom: 0px;padding-left: 0px;padding-right: 0px;padding-top: 0px;";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInjection {
    /// 1-based post position.
    pub post: u32,
    /// 0 is the post body, 1.. are quoted posts.
    pub slot: usize,
    /// Hide the source text instead of showing the translation beside it.
    pub cover: bool,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaInjection {
    pub post: u32,
    pub slot: usize,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteInjection {
    pub post: u32,
    pub slot: usize,
    pub html: String,
}

/// The translation template shown on the primary post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeInjection {
    pub post: u32,
    pub html: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayPlan {
    pub texts: Vec<TextInjection>,
    pub media: Vec<MediaInjection>,
    pub votes: Vec<VoteInjection>,
    pub badge: Option<BadgeInjection>,
    /// Posts below the primary post that have no translation.
    pub hidden_posts: Vec<u32>,
}

/// Maps `set` onto the slots of `layout`, rendering every piece of content.
pub fn plan<S: Sanitizer, M: EmojiMatcher>(
    set: &AnnotationSet,
    layout: &PostLayout,
    renderer: &RichTextRenderer<S, M>,
) -> OverlayPlan {
    let mut plan = OverlayPlan::default();
    let Some(primary) = layout.primary_position() else {
        log::debug!("Empty layout, nothing to inject");
        return plan;
    };

    let mut set = set.clone();
    set.resolve_primary(primary);

    for (post, slots) in (1u32..).zip(&layout.posts) {
        let Some(level) = set.level(LevelKey::Numbered(post)) else {
            if post > primary {
                plan.hidden_posts.push(post);
            }
            continue;
        };
        let is_primary = post == primary;
        log::debug!("Planning post {post} (primary: {is_primary})");

        if slots.text_slots > 0 {
            let cover = if is_primary { set.main_cover } else { set.reply_cover };
            if is_primary {
                let template = set.template.as_deref().unwrap_or_default();
                plan.badge = Some(BadgeInjection {
                    post,
                    html: style_bare_paragraphs(&renderer.render(template)),
                    hidden: set.template_disabled || set.main_cover,
                });
            }
            plan.texts.push(TextInjection {
                post,
                slot: 0,
                cover,
                html: text_html(renderer, &level.content, cover, is_primary),
            });
        }

        plan_quotes(&mut plan, post, slots.text_slots, level, set.quote_cover, renderer);

        for (slot, key) in (0..slots.image_slots).zip(1u32..) {
            if let Some(content) = level.img.get(&key) {
                plan.media.push(MediaInjection {
                    post,
                    slot,
                    html: renderer.render(&content.content),
                });
            }
        }

        for (slot, key) in (0..slots.vote_slots).zip(1u32..) {
            if let Some(content) = level.vote.get(&key) {
                plan.votes.push(VoteInjection {
                    post,
                    slot,
                    html: vote_html(&renderer.render(&content.content)),
                });
            }
        }
    }
    plan
}

fn plan_quotes<S: Sanitizer, M: EmojiMatcher>(
    plan: &mut OverlayPlan,
    post: u32,
    text_slots: usize,
    level: &Level,
    cover: bool,
    renderer: &RichTextRenderer<S, M>,
) {
    for (slot, key) in (1..text_slots).zip(1u32..) {
        if let Some(quote) = level.inlevel.get(&key) {
            plan.texts.push(TextInjection {
                post,
                slot,
                cover,
                html: text_html(renderer, &quote.content, cover, false),
            });
        }
    }
}

fn text_html<S: Sanitizer, M: EmojiMatcher>(
    renderer: &RichTextRenderer<S, M>,
    content: &str,
    cover: bool,
    is_primary: bool,
) -> String {
    let rendered = renderer.render(content);
    let html = if is_primary || cover {
        rendered
    } else {
        format!("{SEPARATOR}{rendered}")
    };
    style_bare_paragraphs(&html)
}

/// Vote options sit on one line: drop the first line break and trim.
fn vote_html(rendered: &str) -> String {
    rendered
        .replacen('\n', "", 1)
        .replacen("<br>", "", 1)
        .replacen("<br/>", "", 1)
        .trim()
        .to_string()
}

fn style_bare_paragraphs(html: &str) -> String {
    html.replace("<p>", &format!(r#"<p style="{PARAGRAPH_STYLE}">"#))
}
