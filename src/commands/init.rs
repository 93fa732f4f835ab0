//! Init command - Add the shared bundle as a submodule, then sync

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::sync::{self, SyncOptions};
use super::utils;
use cursor_sync::git::{self, AddOutcome};

/// Execute the init command
pub fn execute(repo: &str, path: &str, options: SyncOptions) -> Result<()> {
    let project = utils::project_root(options.project.as_deref())?;

    println!("Adding shared config:");
    println!("  Repository: {}", repo);
    println!("  Path: {}", path);
    println!();

    if options.dry_run {
        println!("{}", "(DRY-RUN) Submodule not added.".blue());
    } else {
        match git::add_submodule(&project, repo, path).context("Failed to add submodule")? {
            AddOutcome::Added => println!("{} {}", "Added:".green(), path),
            AddOutcome::AlreadyPresent => {
                println!("{} {} already exists", "Note:".yellow(), path)
            }
        }
        println!();
    }

    sync::execute(&SyncOptions {
        project: Some(project.clone()),
        bundle: Some(options.bundle.clone().unwrap_or_else(|| project.join(path))),
        ..options
    })
}
