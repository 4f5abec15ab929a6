//! Marker rule table.
//!
//! Each rule is an anchored pattern plus what to do with a match. Rules are
//! grouped by [`Scope`] and the groups are tried in [`PRECEDENCE`] order;
//! inside a group the first rule that matches wins.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::ShorthandError;

/// What a marker addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Config,
    Level,
    InlineLevel,
    Vote,
    Image,
}

/// Config is tried first so `覆盖` style flags never open a level.
pub const PRECEDENCE: [Scope; 5] = [
    Scope::Config,
    Scope::Level,
    Scope::InlineLevel,
    Scope::Vote,
    Scope::Image,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverFlag {
    Main,
    Reply,
    Quote,
}

/// Side effect of a config marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    Cover(CoverFlag, bool),
    AllCover(bool),
    DisableTemplate,
    /// Replace the template with the segment text.
    Template,
    /// Set the template only if none is set yet.
    DefaultTemplate,
}

/// Key used when the marker carries no usable number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKey {
    Primary,
    /// Next value of the per-scope counter.
    Next,
    Config(ConfigAction),
}

type KeyExtractor = fn(&Captures<'_>) -> Result<Option<u32>, ShorthandError>;

pub struct MarkRule {
    pub scope: Scope,
    pattern: Regex,
    /// A match followed by one of these is not a match (`层` must not eat `层内`).
    not_followed_by: &'static [&'static str],
    extract_key: KeyExtractor,
    pub default_key: DefaultKey,
}

/// A rule applied to one segment.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'s> {
    pub scope: Scope,
    pub default_key: DefaultKey,
    /// Number written in the marker, if any and non-zero.
    pub explicit_key: Option<u32>,
    /// Segment text after the marker, trimmed.
    pub residual: &'s str,
}

impl MarkRule {
    fn new(scope: Scope, pattern: &str, extract_key: KeyExtractor, default_key: DefaultKey) -> Self {
        Self {
            scope,
            pattern: Regex::new(pattern).expect("Invalid marker regex"),
            not_followed_by: &[],
            extract_key,
            default_key,
        }
    }

    fn config(pattern: &str, action: ConfigAction) -> Self {
        Self::new(Scope::Config, pattern, no_key, DefaultKey::Config(action))
    }

    fn keyed(scope: Scope, pattern: &str) -> Self {
        Self::new(scope, pattern, numeric_key, DefaultKey::Next)
    }

    fn unless_followed_by(mut self, prefixes: &'static [&'static str]) -> Self {
        self.not_followed_by = prefixes;
        self
    }

    /// Matches the rule against the start of `segment`.
    ///
    /// `None` when the rule does not apply; `Some(Err)` when it applies but the
    /// number in the marker is unusable.
    pub fn try_match<'s>(&self, segment: &'s str) -> Option<Result<RuleMatch<'s>, ShorthandError>> {
        let caps = self.pattern.captures(segment)?;
        let whole = caps.get(0)?;
        let rest = &segment[whole.end()..];
        if self.not_followed_by.iter().any(|p| rest.starts_with(p)) {
            return None;
        }
        Some((self.extract_key)(&caps).map(|explicit_key| RuleMatch {
            scope: self.scope,
            default_key: self.default_key,
            explicit_key,
            residual: rest.trim(),
        }))
    }
}

fn no_key(_: &Captures<'_>) -> Result<Option<u32>, ShorthandError> {
    Ok(None)
}

/// First capture group as a slot number. Empty or zero means "not given".
fn numeric_key(caps: &Captures<'_>) -> Result<Option<u32>, ShorthandError> {
    let Some(digits) = caps.get(1).map(|m| m.as_str()).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    let n: u32 = digits.parse().map_err(|_| ShorthandError::InvalidKey {
        raw: digits.to_string(),
    })?;
    Ok((n != 0).then_some(n))
}

/// `回复N` is reply N, which is post N+1 of the thread.
fn reply_key(caps: &Captures<'_>) -> Result<Option<u32>, ShorthandError> {
    match numeric_key(caps)? {
        Some(n) => n
            .checked_add(1)
            .map(Some)
            .ok_or_else(|| ShorthandError::InvalidKey { raw: n.to_string() }),
        None => Ok(None),
    }
}

pub struct RuleTable {
    groups: Vec<(Scope, Vec<MarkRule>)>,
}

impl RuleTable {
    fn build() -> Self {
        use ConfigAction::*;
        use CoverFlag::*;

        let config = vec![
            MarkRule::config(r"^(?:回复覆盖|覆盖回复)", Cover(Reply, true)),
            MarkRule::config(
                r"^(?:转评覆盖|覆盖转评|引用覆盖|覆盖引用|内嵌覆盖|覆盖内嵌)",
                Cover(Quote, true),
            ),
            MarkRule::config(r"^(?:回复不覆盖|不覆盖回复)", Cover(Reply, false)),
            MarkRule::config(
                r"^(?:转评不覆盖|不覆盖转评|引用不覆盖|不覆盖引用|内嵌不覆盖|不覆盖内嵌)",
                Cover(Quote, false),
            ),
            MarkRule::config(r"^(?:无模版|无模板|无logo)", DisableTemplate),
            MarkRule::config(r"^(?:全覆盖|全部覆盖|覆盖全部|覆盖全)", AllCover(true)),
            MarkRule::config(r"^(?:全不覆盖|全部不覆盖|不覆盖全部|不覆盖全)", AllCover(false)),
            MarkRule::config(r"^(?:模版|模板|logo)", Template),
            MarkRule::config(r"^(?:烤推模版|烤推模板)", Template),
            MarkRule::config(r"^(?:默认模版|默认模板)", DefaultTemplate),
            MarkRule::config(r"^(?:推文)?覆盖(?:推文)?", Cover(Main, true)),
            MarkRule::config(r"^(?:推文)?不覆盖(?:推文)?", Cover(Main, false)),
        ];

        let level = vec![
            MarkRule::new(Scope::Level, r"^(?:last|main)", no_key, DefaultKey::Primary),
            MarkRule::keyed(Scope::Level, r"^层([0-9]*)").unless_followed_by(&["内"]),
            MarkRule::keyed(Scope::Level, r"^第([0-9]*)层"),
            MarkRule::new(Scope::Level, r"^回复([0-9]*)", reply_key, DefaultKey::Next),
            MarkRule::keyed(Scope::Level, r"^([0-9]+)"),
        ];

        let inlevel = vec![
            MarkRule::keyed(Scope::InlineLevel, r"^层内([0-9]*)"),
            MarkRule::keyed(Scope::InlineLevel, r"^引用([0-9]*)"),
            MarkRule::keyed(Scope::InlineLevel, r"^内嵌([0-9]*)"),
        ];

        let vote = vec![
            MarkRule::keyed(Scope::Vote, r"^投票([0-9]*)"),
            MarkRule::keyed(Scope::Vote, r"^选项([0-9]*)"),
        ];

        let image = vec![MarkRule::keyed(Scope::Image, r"^图片([0-9]*)")];

        let mut groups = vec![
            (Scope::Config, config),
            (Scope::Level, level),
            (Scope::InlineLevel, inlevel),
            (Scope::Vote, vote),
            (Scope::Image, image),
        ];
        groups.sort_by_key(|(scope, _)| PRECEDENCE.iter().position(|s| s == scope));
        Self { groups }
    }

    /// First matching rule in precedence order, or `None` if no marker applies.
    pub fn resolve<'s>(&self, segment: &'s str) -> Option<Result<RuleMatch<'s>, ShorthandError>> {
        self.groups
            .iter()
            .flat_map(|(_, rules)| rules.iter())
            .find_map(|rule| rule.try_match(segment))
    }
}

/// The shared, immutable rule table.
pub fn rules() -> &'static RuleTable {
    static RULES: OnceLock<RuleTable> = OnceLock::new();
    RULES.get_or_init(RuleTable::build)
}
