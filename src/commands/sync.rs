//! Sync command - Plan and apply the bundle into a project's config directory

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use super::utils;
use cursor_sync::config::{self, LinkStyle, SyncConfig};
use cursor_sync::sync::{self as engine, OutcomeStatus};

/// Options shared by every command that ends in a sync
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Project root (current directory if None)
    pub project: Option<PathBuf>,
    /// Bundle root (`<project>/.cursor-shared` if None)
    pub bundle: Option<PathBuf>,
    /// Destination config dir (`<project>/.cursor` if None)
    pub dest: Option<PathBuf>,
    pub dry_run: bool,
    pub prune: bool,
    pub absolute_links: bool,
    pub json: bool,
}

/// Execute the sync command
pub fn execute(options: &SyncOptions) -> Result<()> {
    let project = utils::project_root(options.project.as_deref())?;
    let bundle = options
        .bundle
        .clone()
        .unwrap_or_else(|| config::default_bundle_dir(&project));
    let dest = options
        .dest
        .clone()
        .unwrap_or_else(|| config::default_dest_dir(&project));

    let mut sync_config = SyncConfig::load(&bundle).context("Failed to load bundle manifest")?;
    if options.prune {
        sync_config.prune = true;
    }
    if options.absolute_links {
        sync_config.link_style = LinkStyle::Absolute;
    }

    let plan = engine::plan(&bundle, &dest, &sync_config)
        .with_context(|| format!("Failed to plan sync from {}", bundle.display()))?;

    if options.dry_run {
        if options.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            println!("{}", "(DRY-RUN) Would perform the following:".blue());
            println!("{}", utils::format_plan(&plan, &project));
        }
        return Ok(());
    }

    if !options.json {
        println!("Syncing:");
        println!("  Bundle: {}", plan.bundle_root.display());
        println!("  Destination: {}", plan.dest_root.display());
        println!();
    }

    let result = engine::apply(&plan);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", utils::format_outcomes(&result, &project));
        println!();
    }

    let applied = result.count(OutcomeStatus::Applied);
    let result = result
        .into_result()
        .with_context(|| format!("Sync stopped after {} applied operation(s)", applied))?;

    if !options.json {
        if applied == 0 {
            println!("{}", "Already up to date.".green());
        } else {
            println!(
                "{} {} applied, {} skipped",
                "Sync complete!".green(),
                applied,
                result.count(OutcomeStatus::Skipped)
            );
        }
    }

    Ok(())
}
