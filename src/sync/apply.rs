//! Applying a plan
//!
//! Operations run in plan order and the first failure stops the run. The
//! result records what happened to every operation, including the ones that
//! never ran, so a caller can show exactly where things stopped. Re-planning
//! and re-applying is always safe.

use fs_extra::dir::{self, CopyOptions};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use super::link::{ensure_outside_bundle, ensure_real_dir, remove_link, replace_with_link};
use super::{Operation, SyncError, SyncPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Applied,
    Skipped,
    Failed,
    /// Not attempted because an earlier operation failed
    NotRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-operation log of an apply run
#[derive(Debug, Serialize)]
pub struct ApplyResult {
    pub outcomes: Vec<OperationOutcome>,
    #[serde(skip)]
    error: Option<SyncError>,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The error that aborted the run, if any
    pub fn error(&self) -> Option<&SyncError> {
        self.error.as_ref()
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Convert into a `Result`. On failure only the aborting error survives,
    /// so report `outcomes` before calling this.
    pub fn into_result(self) -> Result<Self, SyncError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// Execute a plan in order, stopping at the first failure
pub fn apply(plan: &SyncPlan) -> ApplyResult {
    let mut outcomes = Vec::with_capacity(plan.len());
    let mut error = None;

    for operation in plan.iter() {
        if error.is_some() {
            outcomes.push(OperationOutcome {
                operation: operation.clone(),
                status: OutcomeStatus::NotRun,
                error: None,
            });
            continue;
        }

        match execute(operation, &plan.bundle_root) {
            Ok(status) => {
                if status == OutcomeStatus::Applied {
                    tracing::info!(op = %operation, "applied");
                }
                outcomes.push(OperationOutcome {
                    operation: operation.clone(),
                    status,
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(op = %operation, error = %e, "operation failed");
                outcomes.push(OperationOutcome {
                    operation: operation.clone(),
                    status: OutcomeStatus::Failed,
                    error: Some(e.to_string()),
                });
                error = Some(e);
            }
        }
    }

    let result = ApplyResult { outcomes, error };
    tracing::info!(
        applied = result.count(OutcomeStatus::Applied),
        skipped = result.count(OutcomeStatus::Skipped),
        failed = result.count(OutcomeStatus::Failed),
        "sync finished"
    );
    result
}

fn execute(operation: &Operation, bundle: &Path) -> Result<OutcomeStatus, SyncError> {
    match operation {
        Operation::EnsureDir { path } => {
            ensure_outside_bundle(path, bundle)?;
            ensure_real_dir(path, bundle)?;
            Ok(OutcomeStatus::Applied)
        }
        Operation::LinkShared {
            source,
            dest,
            target,
        } => {
            ensure_outside_bundle(dest, bundle)?;
            ensure_parent(dest)?;
            replace_with_link(source, dest, target, bundle)?;
            Ok(OutcomeStatus::Applied)
        }
        Operation::PlaceCustomizable { source, dest } => {
            ensure_outside_bundle(dest, bundle)?;
            ensure_parent(dest)?;
            if source.is_dir() {
                copy_dir_once(source, dest)
            } else {
                copy_file_once(source, dest)
            }
        }
        Operation::Skip { .. } => Ok(OutcomeStatus::Skipped),
        Operation::RemoveStale { path } => match remove_link(path) {
            Ok(()) => Ok(OutcomeStatus::Applied),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(OutcomeStatus::Skipped),
            Err(e) => Err(SyncError::io("remove", path, e)),
        },
    }
}

fn ensure_parent(path: &Path) -> Result<(), SyncError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| SyncError::io("create", parent, e)),
        None => Ok(()),
    }
}

/// Copy bytes to a new file; an existing `dest` is never touched
fn copy_file_once(source: &Path, dest: &Path) -> Result<OutcomeStatus, SyncError> {
    let mut reader = File::open(source).map_err(|e| SyncError::io("read", source, e))?;
    let mut writer = match OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(OutcomeStatus::Skipped),
        Err(e) => return Err(SyncError::io("copy", dest, e)),
    };

    if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all()) {
        drop(writer);
        // A truncated copy would otherwise be kept forever as the project's own
        let _ = fs::remove_file(dest);
        return Err(SyncError::io("copy", dest, e));
    }
    Ok(OutcomeStatus::Applied)
}

fn copy_dir_once(source: &Path, dest: &Path) -> Result<OutcomeStatus, SyncError> {
    if fs::symlink_metadata(dest).is_ok() {
        return Ok(OutcomeStatus::Skipped);
    }
    let options = CopyOptions::new().copy_inside(true);
    dir::copy(source, dest, &options)
        .map_err(|e| SyncError::io("copy", dest, io::Error::other(e.to_string())))?;
    Ok(OutcomeStatus::Applied)
}
