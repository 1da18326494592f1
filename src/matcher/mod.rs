//! Staged path vs. reservation pattern matching.
//!
//! Matching runs in two phases. A union matcher over every effective pattern
//! rejects most paths with a single query; only paths it cannot rule out are
//! tested pattern by pattern to attribute the conflict to its holders.

mod fnmatch;
#[cfg(feature = "gitignore")]
mod gitignore;

pub use fnmatch::FnmatchMatcher;
#[cfg(feature = "gitignore")]
pub use gitignore::GitignoreMatcher;

use tracing::debug;

use crate::model::{Conflict, EffectiveReservation, normalize_path};

pub trait PathMatcher {
    /// `path` is already slash-normalized.
    fn matches(&self, path: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherEngine {
    /// Full gitignore semantics (`**`, anchoring, negation).
    Gitignore,
    /// Whole-path fnmatch, best effort.
    Fnmatch,
}

impl MatcherEngine {
    /// The best engine compiled into this build.
    pub fn detect() -> Self {
        if cfg!(feature = "gitignore") {
            MatcherEngine::Gitignore
        } else {
            MatcherEngine::Fnmatch
        }
    }
}

/// Effective reservations compiled for repeated path checks.
pub struct ConflictDetector<'a> {
    union: Option<Box<dyn PathMatcher>>,
    entries: Vec<(&'a EffectiveReservation, Box<dyn PathMatcher>)>,
}

impl<'a> ConflictDetector<'a> {
    pub fn compile(reservations: &'a [EffectiveReservation], engine: MatcherEngine) -> Self {
        debug!(?engine, patterns = reservations.len(), "compiling reservation patterns");
        let entries = reservations
            .iter()
            .map(|res| (res, compile_one(res, engine)))
            .collect();
        let union = if reservations.is_empty() {
            None
        } else {
            compile_union(reservations, engine)
        };
        Self { union, entries }
    }

    /// Whether phase-one rejection is available.
    pub fn has_union(&self) -> bool {
        self.union.is_some()
    }

    /// Every reservation `path` collides with, in reservation order.
    pub fn conflicts_for(&self, path: &str) -> Vec<Conflict> {
        if self.entries.is_empty() {
            return vec![];
        }
        let norm = normalize_path(path);
        if let Some(union) = &self.union
            && !union.matches(&norm)
        {
            return vec![];
        }
        self.entries
            .iter()
            .filter(|(_, matcher)| matcher.matches(&norm))
            .map(|(res, _)| Conflict {
                pattern: res.pattern.clone(),
                path: path.to_string(),
                holder: res.holder.clone(),
            })
            .collect()
    }
}

/// All conflicts between `paths` and `reservations`, path-major.
pub fn find_conflicts(
    reservations: &[EffectiveReservation],
    paths: &[String],
    engine: MatcherEngine,
) -> Vec<Conflict> {
    let detector = ConflictDetector::compile(reservations, engine);
    paths
        .iter()
        .flat_map(|path| detector.conflicts_for(path))
        .collect()
}

fn compile_one(res: &EffectiveReservation, engine: MatcherEngine) -> Box<dyn PathMatcher> {
    match engine {
        #[cfg(feature = "gitignore")]
        MatcherEngine::Gitignore => {
            // Anchoring is decided by the pattern as written, so only the
            // separators are normalized here.
            match GitignoreMatcher::new([res.pattern.replace('\\', "/")]) {
                Ok(m) => Box::new(m),
                Err(e) => {
                    debug!(pattern = %res.pattern, error = %e, "falling back to fnmatch");
                    Box::new(FnmatchMatcher::new(&res.normalized))
                }
            }
        }
        _ => Box::new(FnmatchMatcher::new(&res.normalized)),
    }
}

fn compile_union(
    reservations: &[EffectiveReservation],
    engine: MatcherEngine,
) -> Option<Box<dyn PathMatcher>> {
    match engine {
        #[cfg(feature = "gitignore")]
        MatcherEngine::Gitignore => {
            match GitignoreMatcher::new(reservations.iter().map(|r| r.normalized.as_str())) {
                Ok(m) => Some(Box::new(m)),
                Err(e) => {
                    debug!(error = %e, "union matcher unavailable; checking every pattern");
                    None
                }
            }
        }
        _ => None,
    }
}
