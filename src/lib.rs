//! cursor-sync library
//!
//! Keeps a project's `.cursor/` directory in step with a shared bundle of
//! rules, skills and agents. Shared entries are symlinked so they always
//! track the bundle; customizable entries are copied once and then belong
//! to the project.

pub mod config;
pub mod git;
pub mod sync;

// Re-exports for library consumers
pub use config::SyncConfig;
pub use sync::{apply, plan, ApplyResult, Operation, SyncError, SyncPlan};
