use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("AGENT_NAME environment variable is required")]
    MissingAgent,

    #[error("not inside a git repository: {0}")]
    NotGitRepository(String),

    #[error("hook file '{0}' is not a regular file")]
    HookNotOurs(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

impl GuardError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAgent => "missing_agent",
            Self::NotGitRepository(_) => "not_git_repository",
            Self::HookNotOurs(_) => "hook_not_ours",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Git(_) => "git_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;
