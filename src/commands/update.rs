//! Update command - Pull the latest shared bundle, then re-sync
//!
//! Customized files are never touched; shared links are refreshed so they
//! track whatever the new bundle revision contains.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::sync::{self, SyncOptions};
use super::utils;
use cursor_sync::git;

/// Execute the update command
pub fn execute(path: &str, options: SyncOptions) -> Result<()> {
    let project = utils::project_root(options.project.as_deref())?;

    if options.dry_run {
        println!("{}", "(DRY-RUN) Submodule not updated.".blue());
    } else {
        println!("Updating {}...", path);
        git::update_submodule(&project, path).context("Failed to update submodule")?;
        println!();
    }

    sync::execute(&SyncOptions {
        project: Some(project.clone()),
        bundle: Some(options.bundle.clone().unwrap_or_else(|| project.join(path))),
        ..options
    })
}
