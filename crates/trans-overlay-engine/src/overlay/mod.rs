//! Planning where rendered translations go on a tweet page.
//!
//! The page layer reports a [`PostLayout`]; [`plan`] pairs it with an
//! [`AnnotationSet`](crate::shorthand::AnnotationSet) and returns plain data
//! describing every injection. Nothing here touches a DOM.

pub mod layout;
pub mod plan;

pub use layout::{PostLayout, PostSlots};
pub use plan::{
    BadgeInjection, MediaInjection, OverlayPlan, PARAGRAPH_STYLE, SEPARATOR, TextInjection,
    VoteInjection, plan,
};
