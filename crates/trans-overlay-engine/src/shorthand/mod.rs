//! # Shorthand Parsing
//!
//! Turns a flat `##`-delimited annotation string into an [`AnnotationSet`].
//!
//! ## Grammar
//!
//! ```text
//! shorthand := segment ("##" segment)*
//! segment   := marker? content
//! ```
//!
//! Markers are short Chinese or numeric tokens at the start of a segment
//! (`层2`, `图片1`, `投票1`, `全覆盖`, ...). The full table lives in [`rules`].
//!
//! ## Modules
//!
//! - **`types`**: `AnnotationSet`, `Level`, `Content`, `LevelKey`
//! - **`rules`**: the immutable marker table and its precedence order
//! - **`parser`**: `parse()` and the per-call key counters
//!
//! Parsing never fails. Unknown markers become a new auto-numbered level and
//! segments whose marker number is unusable are logged and skipped.

pub mod parser;
pub mod rules;
pub mod types;

pub use parser::{parse, parse_with_default_template};
pub use types::{AnnotationSet, Content, InlineLevel, Level, LevelKey};

#[derive(Debug, thiserror::Error)]
pub enum ShorthandError {
    #[error("marker number `{raw}` is not a usable slot index")]
    InvalidKey { raw: String },
}
