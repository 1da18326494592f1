use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::error::{GuardError, Result};
use crate::git;
use crate::output::Format;

const SHEBANG: &str = "#!/bin/sh";
const BLOCK_START: &str = "# >>> resguard pre-commit >>>";
const BLOCK_END: &str = "# <<< resguard pre-commit <<<";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    Installed,
    Outdated,
    NotInstalled,
}

impl HookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HookStatus::Installed => "installed",
            HookStatus::Outdated => "outdated",
            HookStatus::NotInstalled => "not installed",
        }
    }
}

fn hook_body(store_dir: Option<&Path>) -> String {
    match store_dir {
        Some(dir) => format!(
            "resguard pre-commit --reservations-dir {} || exit $?",
            shell_quote(&dir.display().to_string())
        ),
        None => "resguard pre-commit || exit $?".to_string(),
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn upsert_marked_block(existing: &str, start: &str, end: &str, body: &str) -> (String, bool) {
    let block = format!("{}\n{}\n{}", start, body, end);

    if let Some(start_idx) = existing.find(start)
        && let Some(end_rel) = existing[start_idx..].find(end)
    {
        let end_idx = start_idx + end_rel + end.len();
        let mut updated = String::new();
        updated.push_str(&existing[..start_idx]);
        updated.push_str(&block);
        updated.push_str(&existing[end_idx..]);
        let changed = updated != existing;
        return (updated, changed);
    }

    let mut updated = existing.to_string();
    if updated.trim().is_empty() {
        updated = format!("{block}\n");
    } else {
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push('\n');
        updated.push_str(&block);
        updated.push('\n');
    }

    let changed = updated != existing;
    (updated, changed)
}

fn remove_marked_block(existing: &str, start: &str, end: &str) -> (String, bool) {
    if let Some(start_idx) = existing.find(start)
        && let Some(end_rel) = existing[start_idx..].find(end)
    {
        let end_idx = start_idx + end_rel + end.len();
        let mut updated = String::new();
        updated.push_str(existing[..start_idx].trim_end_matches('\n'));
        let rest = &existing[end_idx..];
        if !updated.is_empty() || !rest.trim().is_empty() {
            updated.push('\n');
        }
        updated.push_str(rest.trim_start_matches('\n'));
        return (updated, true);
    }
    (existing.to_string(), false)
}

fn marked_block_body<'a>(existing: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let start_idx = existing.find(start)? + start.len();
    let end_rel = existing[start_idx..].find(end)?;
    Some(existing[start_idx..start_idx + end_rel].trim())
}

fn read_hook(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    if !path.is_file() {
        return Err(GuardError::HookNotOurs(path.display().to_string()));
    }
    Ok(Some(fs::read_to_string(path)?))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Add or refresh the guard block in the hook at `hook_path`, keeping any
/// other content. Returns whether the file changed.
pub fn install_at(hook_path: &Path, store_dir: Option<&Path>) -> Result<bool> {
    let existing = read_hook(hook_path)?.unwrap_or_else(|| format!("{SHEBANG}\n"));
    let (updated, changed) =
        upsert_marked_block(&existing, BLOCK_START, BLOCK_END, &hook_body(store_dir));
    if changed {
        if let Some(parent) = hook_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(hook_path, updated)?;
    }
    make_executable(hook_path)?;
    Ok(changed)
}

/// Remove the guard block. The hook file is deleted when nothing but the
/// shebang is left. Returns whether anything was removed.
pub fn uninstall_at(hook_path: &Path) -> Result<bool> {
    let Some(existing) = read_hook(hook_path)? else {
        return Ok(false);
    };
    let (updated, removed) = remove_marked_block(&existing, BLOCK_START, BLOCK_END);
    if !removed {
        return Ok(false);
    }
    let leftover = updated.trim();
    if leftover.is_empty() || leftover == SHEBANG {
        fs::remove_file(hook_path)?;
    } else {
        fs::write(hook_path, updated)?;
    }
    Ok(true)
}

/// Whether the guard block is present. With `store_dir` the block must also
/// point at that directory to count as installed.
pub fn status_at(hook_path: &Path, store_dir: Option<&Path>) -> HookStatus {
    let Ok(Some(content)) = read_hook(hook_path) else {
        return HookStatus::NotInstalled;
    };
    match marked_block_body(&content, BLOCK_START, BLOCK_END) {
        None => HookStatus::NotInstalled,
        Some(body) if store_dir.is_some() && body != hook_body(store_dir) => HookStatus::Outdated,
        Some(_) => HookStatus::Installed,
    }
}

fn pre_commit_path(repo_root: &Path) -> Result<PathBuf> {
    Ok(git::hooks_dir(repo_root)?.join("pre-commit"))
}

pub fn install(repo_root: &Path, store_dir: Option<&Path>, format: Format) -> Result<()> {
    let path = pre_commit_path(repo_root)?;
    let changed = install_at(&path, store_dir)?;
    match format {
        Format::Json => println!(
            "{}",
            json!({"action": "install", "changed": changed, "path": path.display().to_string()})
        ),
        Format::Pretty => {
            if changed {
                eprintln!("Installed pre-commit guard: {}", path.display());
            } else {
                eprintln!("Pre-commit guard already installed: {}", path.display());
            }
        }
        Format::Minimal => println!("{}", path.display()),
    }
    Ok(())
}

pub fn uninstall(repo_root: &Path, format: Format) -> Result<()> {
    let path = pre_commit_path(repo_root)?;
    let removed = uninstall_at(&path)?;
    match format {
        Format::Json => println!(
            "{}",
            json!({"action": "uninstall", "removed": removed, "path": path.display().to_string()})
        ),
        Format::Pretty => {
            if removed {
                eprintln!("Removed pre-commit guard: {}", path.display());
            } else {
                eprintln!("No pre-commit guard found: {}", path.display());
            }
        }
        Format::Minimal => println!("{}", if removed { "removed" } else { "absent" }),
    }
    Ok(())
}

/// Report hook status. Returns true only when installed and current.
pub fn status(repo_root: &Path, store_dir: Option<&Path>, format: Format) -> Result<bool> {
    let path = pre_commit_path(repo_root)?;
    let status = status_at(&path, store_dir);
    match format {
        Format::Json => println!(
            "{}",
            json!({"status": status.as_str(), "path": path.display().to_string()})
        ),
        Format::Pretty => eprintln!("pre-commit guard: {} ({})", status.as_str(), path.display()),
        Format::Minimal => println!("{}", status.as_str()),
    }
    Ok(status == HookStatus::Installed)
}
