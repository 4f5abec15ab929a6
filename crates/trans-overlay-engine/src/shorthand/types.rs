use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Identifies one structural slot of a post thread.
///
/// `last` and `main` in shorthand both name the primary post, so they share
/// the single [`LevelKey::Primary`] variant instead of two string sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LevelKey {
    /// 1-based position in the thread.
    Numbered(u32),
    /// The primary post, wherever it sits in the thread.
    Primary,
}

impl fmt::Display for LevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelKey::Numbered(n) => write!(f, "{n}"),
            LevelKey::Primary => f.write_str("last"),
        }
    }
}

// Map keys in JSON must be strings, so keys serialize through Display.
impl Serialize for LevelKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A leaf annotation unit: one image override, one vote option, one quoted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub key: u32,
    pub content: String,
}

impl Content {
    pub fn new(key: u32, content: impl Into<String>) -> Self {
        Self {
            key,
            content: content.into(),
        }
    }
}

/// Annotation for a quoted/embedded post inside a [`Level`].
pub type InlineLevel = Content;

/// Annotation payload for one post in the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub key: LevelKey,
    /// Annotation for the post body.
    pub content: String,
    /// Quoted-post annotations keyed by 1-based quote index.
    pub inlevel: BTreeMap<u32, InlineLevel>,
    /// Image overrides keyed by 1-based image index.
    pub img: BTreeMap<u32, Content>,
    /// Vote option overrides keyed by 1-based option index.
    pub vote: BTreeMap<u32, Content>,
}

impl Level {
    pub fn new(key: LevelKey, content: impl Into<String>) -> Self {
        Self {
            key,
            content: content.into(),
            inlevel: BTreeMap::new(),
            img: BTreeMap::new(),
            vote: BTreeMap::new(),
        }
    }
}

/// Everything one shorthand string says about a thread.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AnnotationSet {
    /// Annotation replaces the primary post body instead of following it.
    pub main_cover: bool,
    /// Annotation replaces reply bodies.
    pub reply_cover: bool,
    /// Annotation replaces quoted post bodies.
    pub quote_cover: bool,
    /// Suppress the template badge.
    pub template_disabled: bool,
    /// HTML fragment shown once as a badge next to the primary annotation.
    pub template: Option<String>,
    pub levels: BTreeMap<LevelKey, Level>,
}

impl AnnotationSet {
    pub fn level(&self, key: LevelKey) -> Option<&Level> {
        self.levels.get(&key)
    }

    pub fn primary(&self) -> Option<&Level> {
        self.level(LevelKey::Primary)
    }

    /// Sets all three cover flags at once.
    pub fn set_all_cover(&mut self, cover: bool) {
        self.main_cover = cover;
        self.reply_cover = cover;
        self.quote_cover = cover;
    }

    /// Writes the primary level over the numbered level at `primary_position`.
    ///
    /// The primary post is also the post numbered `primary_position` in the
    /// thread; when both are annotated the primary entry wins. No-op when no
    /// primary level was parsed.
    pub fn resolve_primary(&mut self, primary_position: u32) {
        if let Some(primary) = self.levels.get(&LevelKey::Primary) {
            let mut aliased = primary.clone();
            aliased.key = LevelKey::Numbered(primary_position);
            self.levels.insert(aliased.key, aliased);
        }
    }
}
