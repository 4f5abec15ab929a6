pub mod escape;
pub mod overlay;
pub mod render;
pub mod shorthand;

// Re-export key types for easier usage
pub use overlay::{
    BadgeInjection, MediaInjection, OverlayPlan, PostLayout, PostSlots, TextInjection,
    VoteInjection, plan,
};
pub use render::{
    AllowList, AllowListSanitizer, EmojiMatcher, EmojiOptions, GraphemeEmojiMatcher, RenderError,
    RenderOptions, RichTextRenderer, SanitizeError, Sanitizer,
};
pub use shorthand::{
    AnnotationSet, Content, InlineLevel, Level, LevelKey, ShorthandError, parse,
    parse_with_default_template,
};
