use std::path::PathBuf;

use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use resguard::error::Result;
use resguard::output::Format;

#[derive(Parser)]
#[command(
    name = "resguard",
    about = "Pre-commit guard for exclusive file reservations held by other agents"
)]
struct Cli {
    /// Output format for informational commands (guard diagnostics are always plain text)
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    format: Format,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Directory of file-reservation JSON documents
    #[arg(long, env = "AGENT_MAIL_RESERVATIONS_DIR")]
    reservations_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check staged changes against other agents' reservations (git hook entry point)
    PreCommit {
        #[command(flatten)]
        store: StoreArgs,
        /// Repository to read staged changes from
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Check explicit paths against other agents' reservations
    Check {
        /// Path to check (repeatable)
        #[arg(long = "path", required = true)]
        paths: Vec<String>,
        /// Agent identity (default: $AGENT_NAME)
        #[arg(long)]
        agent: Option<String>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List the reservations that would currently block an agent
    Reservations {
        /// Agent identity; its own reservations are omitted
        #[arg(long, env = "AGENT_NAME")]
        agent: Option<String>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Manage the git pre-commit hook
    Hook {
        #[command(subcommand)]
        action: HookAction,
    },
}

#[derive(Subcommand)]
enum HookAction {
    /// Add the guard to the repository's pre-commit hook
    Install {
        /// Repository to install into
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Remove the guard from the pre-commit hook
    Uninstall {
        /// Repository to remove from
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Report whether the guard is installed, exit 0/1
    Status {
        /// Repository to inspect
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        #[command(flatten)]
        store: StoreArgs,
    },
}

fn run(cli: Cli, format: Format) -> Result<i32> {
    match cli.command {
        Commands::PreCommit { store, repo } => {
            resguard::commands::guard::pre_commit(&repo, store.reservations_dir.as_deref())
        }
        Commands::Check {
            paths,
            agent,
            store,
        } => resguard::commands::guard::check(paths, agent, store.reservations_dir.as_deref()),
        Commands::Reservations { agent, store } => {
            resguard::commands::reservations::list(
                store.reservations_dir.as_deref(),
                agent.as_deref().filter(|a| !a.is_empty()),
                format,
            )?;
            Ok(0)
        }
        Commands::Hook { action } => match action {
            HookAction::Install { repo, store } => {
                resguard::commands::hook::install(&repo, store.reservations_dir.as_deref(), format)?;
                Ok(0)
            }
            HookAction::Uninstall { repo } => {
                resguard::commands::hook::uninstall(&repo, format)?;
                Ok(0)
            }
            HookAction::Status { repo, store } => {
                let ok = resguard::commands::hook::status(
                    &repo,
                    store.reservations_dir.as_deref(),
                    format,
                )?;
                Ok(if ok { 0 } else { 1 })
            }
        },
    }
}

fn main() {
    resguard::logging::init();

    let matches = Cli::command()
        .version(resguard::build_info::long_version())
        .get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let format = cli.format;

    match run(cli, format) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            match format {
                Format::Json => {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": e.code(),
                            "message": e.to_string()
                        })
                    );
                }
                _ => eprintln!("error: {e}"),
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_requires_a_path() {
        assert!(Cli::try_parse_from(["resguard", "check"]).is_err());
        let cli = Cli::try_parse_from(["resguard", "check", "--path", "a", "--path", "b"]).unwrap();
        match cli.command {
            Commands::Check { paths, .. } => assert_eq!(paths, vec!["a", "b"]),
            _ => panic!("expected check"),
        }
    }
}
