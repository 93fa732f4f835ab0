//! Shared utilities for commands

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use std::path::{Path, PathBuf};

use cursor_sync::sync::{ApplyResult, Operation, OutcomeStatus, SyncPlan};

/// Resolve the project root, defaulting to the current directory
pub fn project_root(project: Option<&Path>) -> Result<PathBuf> {
    let path = match project {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    if !path.is_dir() {
        anyhow::bail!("Project directory does not exist: {}", path.display());
    }
    path.canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))
}

/// Show `path` relative to `base` when it lives underneath it
pub fn display_path(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        Ok(_) => ".".to_string(),
        Err(_) => path.display().to_string(),
    }
}

fn detail(op: &Operation) -> String {
    match op {
        Operation::LinkShared { target, .. } => format!("-> {}", target.display()),
        Operation::PlaceCustomizable { source, .. } => format!("from {}", source.display()),
        Operation::Skip { reason, .. } => reason.clone(),
        Operation::EnsureDir { .. } | Operation::RemoveStale { .. } => String::new(),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.into_iter().map(Cell::new).collect::<Vec<_>>());
    table
}

/// Render a plan as a table
pub fn format_plan(plan: &SyncPlan, base: &Path) -> String {
    let mut table = new_table(vec!["Op", "Path", "Detail"]);
    for op in plan.iter() {
        table.add_row(vec![
            Cell::new(op.kind()),
            Cell::new(display_path(op.path(), base)),
            Cell::new(detail(op)),
        ]);
    }

    let pending = plan.iter().filter(|op| !op.is_skip()).count();
    format!(
        "{}\n\n{} operation(s), {} change(s)",
        table,
        plan.len(),
        pending
    )
}

pub fn status_label(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Applied => "applied",
        OutcomeStatus::Skipped => "skipped",
        OutcomeStatus::Failed => "FAILED",
        OutcomeStatus::NotRun => "not run",
    }
}

/// Render the per-operation outcome log
pub fn format_outcomes(result: &ApplyResult, base: &Path) -> String {
    let mut table = new_table(vec!["Status", "Op", "Path", "Detail"]);
    for outcome in &result.outcomes {
        let op = &outcome.operation;
        let detail = outcome.error.clone().unwrap_or_else(|| detail(op));
        table.add_row(vec![
            Cell::new(status_label(outcome.status)),
            Cell::new(op.kind()),
            Cell::new(display_path(op.path(), base)),
            Cell::new(detail),
        ]);
    }
    table.to_string()
}
