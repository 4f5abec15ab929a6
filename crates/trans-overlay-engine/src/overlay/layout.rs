use serde::{Deserialize, Serialize};

/// Injection points found in one rendered post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSlots {
    /// Slot 0 is the post body; slots 1.. are quoted posts inside it.
    pub text_slots: usize,
    pub image_slots: usize,
    pub vote_slots: usize,
    #[serde(default)]
    pub is_primary: bool,
}

impl PostSlots {
    pub fn new(text_slots: usize, image_slots: usize, vote_slots: usize) -> Self {
        Self {
            text_slots,
            image_slots,
            vote_slots,
            is_primary: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// Posts on the page in display order: the reply chain leading to the
/// primary post, the primary post, then any replies below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLayout {
    pub posts: Vec<PostSlots>,
}

impl PostLayout {
    pub fn new(posts: Vec<PostSlots>) -> Self {
        Self { posts }
    }

    /// `count` posts with one body slot each, the last one primary.
    pub fn thread(count: usize) -> Self {
        let posts = (0..count)
            .map(|i| {
                let slots = PostSlots::new(1, 0, 0);
                if i + 1 == count { slots.primary() } else { slots }
            })
            .collect();
        Self { posts }
    }

    /// 1-based position of the primary post. Without an explicit flag the
    /// last post is primary.
    pub fn primary_position(&self) -> Option<u32> {
        let index = self
            .posts
            .iter()
            .position(|p| p.is_primary)
            .or_else(|| self.posts.len().checked_sub(1))?;
        u32::try_from(index + 1).ok()
    }
}
