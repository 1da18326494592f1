use std::path::Path;

use chrono::Utc;

use crate::config::GuardConfig;
use crate::error::Result;
use crate::git;
use crate::guard::Guard;
use crate::output::print_diagnostics;

/// Hook entry point: check the staged changes of the repository at
/// `repo_root`. Returns the process exit code.
pub fn pre_commit(repo_root: &Path, store_dir: Option<&Path>) -> Result<i32> {
    let config = GuardConfig::from_env();
    let verdict = Guard::new(&config, store_dir).run(|| git::staged_paths(repo_root), Utc::now())?;
    print_diagnostics(&verdict.diagnostics);
    Ok(verdict.exit_code())
}

/// Check an explicit path list. Asking for a check turns the gate on; bypass,
/// mode and identity still come from the environment unless `agent` is given.
pub fn check(paths: Vec<String>, agent: Option<String>, store_dir: Option<&Path>) -> Result<i32> {
    let mut config = GuardConfig::from_env();
    config.gate_enabled = true;
    if let Some(agent) = agent.filter(|a| !a.is_empty()) {
        config.agent = Some(agent);
    }
    let verdict = Guard::new(&config, store_dir).run(|| paths, Utc::now())?;
    print_diagnostics(&verdict.diagnostics);
    Ok(verdict.exit_code())
}
