//! Errors raised while planning or applying a sync

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Bundle root missing, not a directory, or unreadable
    #[error("bundle not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// A destination is occupied by something the engine did not create
    #[error("refusing to replace unmanaged entry: {}", path.display())]
    DestinationConflict { path: PathBuf },

    /// A destination resolves to a location inside the bundle
    #[error("refusing to write inside the bundle: {}", path.display())]
    InsideBundle { path: PathBuf },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}

impl SyncError {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path the error is about
    pub fn path(&self) -> &Path {
        match self {
            Self::SourceNotFound { path }
            | Self::DestinationConflict { path }
            | Self::InsideBundle { path }
            | Self::Io { path, .. }
            | Self::Manifest { path, .. } => path,
        }
    }
}
