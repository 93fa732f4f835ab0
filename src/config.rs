//! Sync configuration: the classification table handed to the planner
//!
//! Defaults describe the standard bundle layout:
//! - `rules/` is walked file by file
//! - `agents/` and `skills/` are linked as whole directories
//! - `rules/project-context.mdc` and `AGENTS.md` are copied once and then
//!   left to the project
//!
//! A bundle can override any of this with a `cursor-sync.json` manifest at
//! its root.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::sync::SyncError;

/// Manifest file name looked up at the bundle root
pub const MANIFEST_FILE: &str = "cursor-sync.json";

/// Environment variable supplying the bundle's remote when `--repo` is absent
pub const REPO_ENV: &str = "CURSOR_SYNC_REPO";

/// Submodule path of the bundle, relative to the project root
pub const DEFAULT_BUNDLE_DIR: &str = ".cursor-shared";

/// Config directory inside the project
pub const DEFAULT_DEST_DIR: &str = ".cursor";

/// Where a customizable entry lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Under the destination root, at the same relative path
    Config,
    /// In the project root (the destination's parent), by file name
    Project,
}

/// One row of the customizable table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizableEntry {
    /// Path relative to the bundle root, `/`-separated
    pub path: String,
    #[serde(default = "default_placement")]
    pub placement: Placement,
}

fn default_placement() -> Placement {
    Placement::Config
}

impl CustomizableEntry {
    pub fn new(path: impl Into<String>, placement: Placement) -> Self {
        Self {
            path: path.into(),
            placement,
        }
    }
}

/// How symlink targets are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    /// Target relative to the link's parent directory
    Relative,
    /// Absolute target path
    Absolute,
}

/// Classification table and options for a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Subtrees synced file by file
    pub tree_dirs: Vec<String>,
    /// Subtrees linked as a single unit
    pub unit_dirs: Vec<String>,
    /// Entries copied once and never overwritten
    pub customizable: Vec<CustomizableEntry>,
    pub link_style: LinkStyle,
    /// Remove orphaned links left behind by earlier runs
    pub prune: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tree_dirs: vec!["rules".to_string()],
            unit_dirs: vec!["agents".to_string(), "skills".to_string()],
            customizable: vec![
                CustomizableEntry::new("rules/project-context.mdc", Placement::Config),
                CustomizableEntry::new("AGENTS.md", Placement::Project),
            ],
            link_style: LinkStyle::Relative,
            prune: false,
        }
    }
}

impl SyncConfig {
    /// Load the manifest from a bundle root, or defaults if it has none
    pub fn load(bundle_root: &Path) -> Result<Self, SyncError> {
        let path = bundle_root.join(MANIFEST_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(SyncError::Manifest {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| SyncError::Manifest {
            path,
            reason: e.to_string(),
        })
    }

    /// Look up the customizable row for a bundle-relative path
    pub fn customizable_entry(&self, rel_path: &str) -> Option<&CustomizableEntry> {
        self.customizable.iter().find(|c| c.path == rel_path)
    }

    /// Replace the customizable table
    pub fn with_customizable(mut self, entries: Vec<CustomizableEntry>) -> Self {
        self.customizable = entries;
        self
    }
}

/// Default bundle location for a project
pub fn default_bundle_dir(project_root: &Path) -> PathBuf {
    project_root.join(DEFAULT_BUNDLE_DIR)
}

/// Default destination for a project
pub fn default_dest_dir(project_root: &Path) -> PathBuf {
    project_root.join(DEFAULT_DEST_DIR)
}
