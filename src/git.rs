//! Git submodule plumbing for materializing the bundle
//!
//! Only `submodule add` and `submodule update` are used; fetching, auth and
//! everything else network-related is left to git itself.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Whether `add` did anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Add `url` as a submodule at `path` (relative to `project_root`)
///
/// Does nothing if `path` already exists, so `init` can be re-run.
pub fn add_submodule(project_root: &Path, url: &str, path: &str) -> Result<AddOutcome> {
    if project_root.join(path).exists() {
        tracing::debug!(path, "submodule path already present");
        return Ok(AddOutcome::AlreadyPresent);
    }
    run_git(project_root, &["submodule", "add", url, path])?;
    Ok(AddOutcome::Added)
}

/// Pull the submodule at `path` to its remote's latest commit
pub fn update_submodule(project_root: &Path, path: &str) -> Result<()> {
    run_git(
        project_root,
        &["submodule", "update", "--init", "--remote", path],
    )
}

fn run_git(cwd: &Path, args: &[&str]) -> Result<()> {
    tracing::info!(cwd = %cwd.display(), "git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_skips_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".cursor-shared")).unwrap();

        let outcome =
            add_submodule(dir.path(), "https://example.invalid/x.git", ".cursor-shared").unwrap();
        assert_eq!(outcome, AddOutcome::AlreadyPresent);
    }

    #[test]
    fn test_git_failure_reports_command() {
        let dir = tempfile::tempdir().unwrap();
        // Not a repository, so git refuses (or git is missing entirely)
        let err = update_submodule(dir.path(), ".cursor-shared").unwrap_err();
        assert!(err.to_string().contains("git submodule update"));
    }
}
