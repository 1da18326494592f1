//! Invocation configuration, resolved once from the environment.

/// Either variable enables the guard.
pub const GATE_VARS: [&str; 2] = ["WORKTREES_ENABLED", "GIT_IDENTITY_ENABLED"];
pub const MODE_VAR: &str = "AGENT_MAIL_GUARD_MODE";
pub const BYPASS_VAR: &str = "AGENT_MAIL_BYPASS";
pub const AGENT_VAR: &str = "AGENT_NAME";
pub const RESERVATIONS_DIR_VAR: &str = "AGENT_MAIL_RESERVATIONS_DIR";

const TRUTHY: [&str; 5] = ["1", "true", "t", "yes", "y"];
const ADVISORY: [&str; 3] = ["warn", "advisory", "adv"];

/// Whether conflicts fail the hook or only warn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Block,
    Advisory,
}

impl Mode {
    pub fn parse(raw: Option<&str>) -> Self {
        let value = raw.unwrap_or("").trim().to_ascii_lowercase();
        if ADVISORY.contains(&value.as_str()) {
            Mode::Advisory
        } else {
            Mode::Block
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuardConfig {
    pub gate_enabled: bool,
    pub mode: Mode,
    pub bypass: bool,
    /// Identity of the committing agent. Empty values are treated as unset.
    pub agent: Option<String>,
}

impl GuardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let gate_enabled = GATE_VARS
            .iter()
            .any(|key| lookup(key).is_some_and(|v| is_truthy(&v)));
        Self {
            gate_enabled,
            mode: Mode::parse(lookup(MODE_VAR).as_deref()),
            bypass: lookup(BYPASS_VAR).is_some_and(|v| is_truthy(&v)),
            agent: lookup(AGENT_VAR).filter(|s| !s.is_empty()),
        }
    }
}

pub fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    TRUTHY.contains(&value.as_str())
}
