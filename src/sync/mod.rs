//! Configuration sync engine
//!
//! Reconciles a shared config bundle into a project's config directory.
//! [`plan`] inspects both trees without touching the disk and returns an
//! ordered [`SyncPlan`]; [`apply`] executes it and reports an outcome per
//! operation. Planning again after a successful apply yields only skips.

mod apply;
mod error;
mod link;
mod plan;

pub use apply::{apply, ApplyResult, OperationOutcome, OutcomeStatus};
pub use error::SyncError;
pub use link::links_supported;
pub use plan::{plan, Operation, SyncPlan};
