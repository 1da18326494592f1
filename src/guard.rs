//! The pre-commit decision: gate, bypass, identity, then conflict checking.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{GuardConfig, Mode};
use crate::error::{GuardError, Result};
use crate::matcher::{MatcherEngine, find_conflicts};
use crate::model::Conflict;
use crate::store::reservations::ReservationStore;

/// Conflicts listed in the report; the rest are counted, not shown.
pub const MAX_REPORTED: usize = 10;

pub const CONFLICT_HEADER: &str = "Exclusive file_reservation conflicts detected";
pub const BYPASS_NOTICE: &str = "[pre-commit] bypass enabled via AGENT_MAIL_BYPASS=1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NoConflicts,
    ConflictsBlocked,
    ConflictsWarned,
}

impl Decision {
    pub fn exit_code(self) -> i32 {
        match self {
            Decision::ConflictsBlocked => 1,
            Decision::NoConflicts | Decision::ConflictsWarned => 0,
        }
    }
}

/// Turn the conflict list into a decision and the lines to print.
pub fn decide(conflicts: &[Conflict], mode: Mode) -> (Decision, Vec<String>) {
    if conflicts.is_empty() {
        return (Decision::NoConflicts, vec![]);
    }
    let mut report = Vec::with_capacity(conflicts.len().min(MAX_REPORTED) + 1);
    report.push(CONFLICT_HEADER.to_string());
    report.extend(
        conflicts
            .iter()
            .take(MAX_REPORTED)
            .map(|c| format!("- {} matches {} (holder: {})", c.path, c.pattern, c.holder)),
    );
    let decision = match mode {
        Mode::Block => Decision::ConflictsBlocked,
        Mode::Advisory => Decision::ConflictsWarned,
    };
    (decision, report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    GateDisabled,
    Bypassed,
    NoPaths,
    Decided(Decision),
}

/// Result of one guard invocation: what happened and what to print on stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    pub diagnostics: Vec<String>,
    pub conflicts: Vec<Conflict>,
}

impl Verdict {
    fn quiet(outcome: Outcome) -> Self {
        Self {
            outcome,
            diagnostics: vec![],
            conflicts: vec![],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            Outcome::Decided(decision) => decision.exit_code(),
            _ => 0,
        }
    }
}

pub struct Guard<'a> {
    config: &'a GuardConfig,
    store_dir: Option<&'a Path>,
    engine: MatcherEngine,
}

impl<'a> Guard<'a> {
    pub fn new(config: &'a GuardConfig, store_dir: Option<&'a Path>) -> Self {
        Self {
            config,
            store_dir,
            engine: MatcherEngine::detect(),
        }
    }

    pub fn with_engine(mut self, engine: MatcherEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Run the guard. `candidate_paths` is only called once the gate, bypass
    /// and identity checks have passed; the store is only read when it
    /// returns something.
    ///
    /// # Errors
    ///
    /// [`GuardError::MissingAgent`] when the gate is on and no identity is set.
    pub fn run<F>(&self, candidate_paths: F, now: DateTime<Utc>) -> Result<Verdict>
    where
        F: FnOnce() -> Vec<String>,
    {
        if !self.config.gate_enabled {
            return Ok(Verdict::quiet(Outcome::GateDisabled));
        }
        if self.config.bypass {
            return Ok(Verdict {
                outcome: Outcome::Bypassed,
                diagnostics: vec![BYPASS_NOTICE.to_string()],
                conflicts: vec![],
            });
        }
        let Some(agent) = self.config.agent.as_deref() else {
            return Err(GuardError::MissingAgent);
        };

        let paths = dedup_paths(candidate_paths());
        if paths.is_empty() {
            debug!("no candidate paths");
            return Ok(Verdict::quiet(Outcome::NoPaths));
        }

        let reservations = match self.store_dir {
            Some(dir) => ReservationStore::open(dir).load_effective(Some(agent), now),
            None => {
                debug!("no reservation directory configured; nothing to check against");
                vec![]
            }
        };
        debug!(
            paths = paths.len(),
            reservations = reservations.len(),
            "checking candidate paths"
        );

        let conflicts = find_conflicts(&reservations, &paths, self.engine);
        let (decision, diagnostics) = decide(&conflicts, self.config.mode);
        Ok(Verdict {
            outcome: Outcome::Decided(decision),
            diagnostics,
            conflicts,
        })
    }
}

/// Drop repeated paths, keeping first occurrences in order.
fn dedup_paths(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .collect()
}
