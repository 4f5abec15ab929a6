use crate::escape;

use super::{
    ShorthandError,
    rules::{ConfigAction, CoverFlag, DefaultKey, RuleMatch, Scope, rules},
    types::{AnnotationSet, Content, Level, LevelKey},
};

/// Segment delimiter.
pub const DELIMITER: &str = "##";

/// Parses a shorthand annotation string.
///
/// `template` seeds [`AnnotationSet::template`]; template markers in the
/// string can replace it. Never fails: segments with an unusable marker
/// number are logged and skipped, segments with no recognised marker become
/// a new auto-numbered level.
///
/// When no later segment opens a level explicitly, the first segment is
/// taken verbatim as the primary post annotation, so text such as `2024年…`
/// is never read as a level number. Otherwise it goes through marker
/// matching like the rest, and only falls back to the primary post when it
/// carries no marker.
pub fn parse(raw: &str, template: Option<&str>) -> AnnotationSet {
    let protected = escape::protect(raw.trim());
    let segments: Vec<&str> = protected.split(DELIMITER).map(str::trim).collect();
    let explicit_levels = segments.iter().skip(1).any(|s| opens_level(s));

    let mut state = ParseState::new(template);
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 && !explicit_levels {
            state.open_level(LevelKey::Primary, segment);
            continue;
        }
        if let Err(e) = state.apply(segment, i == 0) {
            log::warn!(
                "skipping shorthand segment `{}`: {e}",
                escape::restore_escaped(segment)
            );
        }
    }
    state.finish()
}

/// Like [`parse`], falling back to `default_template` when the caller has none.
pub fn parse_with_default_template(
    raw: &str,
    template: Option<&str>,
    default_template: &str,
) -> AnnotationSet {
    parse(raw, Some(template.unwrap_or(default_template)))
}

fn opens_level(segment: &str) -> bool {
    matches!(rules().resolve(segment), Some(Ok(m)) if m.scope == Scope::Level)
}

/// Auto-increment counters, one per scope. Owned by a single parse call.
#[derive(Debug, Default)]
struct KeyCounters {
    counters: [u32; 5],
}

impl KeyCounters {
    fn next(&mut self, scope: Scope) -> u32 {
        let counter = &mut self.counters[scope as usize];
        *counter += 1;
        *counter
    }

    /// Quote, image and vote numbering restarts with every level.
    fn reset_level_scoped(&mut self) {
        for scope in [Scope::InlineLevel, Scope::Vote, Scope::Image] {
            self.counters[scope as usize] = 0;
        }
    }
}

struct ParseState {
    set: AnnotationSet,
    /// Level being accumulated. `None` until the first level opens.
    open: Option<Level>,
    counters: KeyCounters,
}

impl ParseState {
    fn new(template: Option<&str>) -> Self {
        Self {
            set: AnnotationSet {
                template: template.map(str::to_string),
                ..AnnotationSet::default()
            },
            open: None,
            counters: KeyCounters::default(),
        }
    }

    fn apply(&mut self, segment: &str, first: bool) -> Result<(), ShorthandError> {
        let Some(m) = rules().resolve(segment).transpose()? else {
            let key = if first {
                LevelKey::Primary
            } else {
                let key = LevelKey::Numbered(self.counters.next(Scope::Level));
                log::warn!(
                    "no marker in segment `{}`; treating it as level {key}",
                    escape::restore_escaped(segment)
                );
                key
            };
            self.open_level(key, segment);
            return Ok(());
        };
        log::debug!("segment resolved to {:?} {:?}", m.scope, m.explicit_key);

        match (m.scope, m.default_key) {
            (Scope::Config, DefaultKey::Config(action)) => self.apply_config(action, m.residual),
            (Scope::Level, _) => {
                let key = self.level_key(&m);
                self.open_level(key, m.residual);
            }
            (scope, _) => {
                let key = m.explicit_key.unwrap_or_else(|| self.counters.next(scope));
                self.store(scope, key, m.residual);
            }
        }
        Ok(())
    }

    fn level_key(&mut self, m: &RuleMatch<'_>) -> LevelKey {
        match (m.explicit_key, m.default_key) {
            (Some(n), _) => LevelKey::Numbered(n),
            (None, DefaultKey::Primary) => LevelKey::Primary,
            (None, _) => LevelKey::Numbered(self.counters.next(Scope::Level)),
        }
    }

    fn open_level(&mut self, key: LevelKey, content: &str) {
        self.seal();
        self.counters.reset_level_scoped();
        self.open = Some(Level::new(key, escape::restore_escaped(content)));
    }

    fn seal(&mut self) {
        if let Some(level) = self.open.take() {
            self.set.levels.insert(level.key, level);
        }
    }

    fn store(&mut self, scope: Scope, key: u32, content: &str) {
        let Some(level) = self.open.as_mut() else {
            log::warn!("{scope:?} {key} appears before any level; dropped");
            return;
        };
        let slot = match scope {
            Scope::InlineLevel => &mut level.inlevel,
            Scope::Image => &mut level.img,
            Scope::Vote => &mut level.vote,
            Scope::Config | Scope::Level => return,
        };
        slot.insert(key, Content::new(key, escape::restore_escaped(content)));
    }

    fn apply_config(&mut self, action: ConfigAction, residual: &str) {
        let set = &mut self.set;
        match action {
            ConfigAction::Cover(CoverFlag::Main, v) => set.main_cover = v,
            ConfigAction::Cover(CoverFlag::Reply, v) => set.reply_cover = v,
            ConfigAction::Cover(CoverFlag::Quote, v) => set.quote_cover = v,
            ConfigAction::AllCover(v) => set.set_all_cover(v),
            ConfigAction::DisableTemplate => set.template_disabled = true,
            ConfigAction::Template => set.template = Some(escape::restore_escaped(residual)),
            ConfigAction::DefaultTemplate => {
                if set.template.as_deref().is_none_or(str::is_empty) {
                    set.template = Some(escape::restore_escaped(residual));
                }
            }
        }
    }

    fn finish(mut self) -> AnnotationSet {
        self.seal();
        self.set
    }
}
