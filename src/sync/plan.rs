//! Planning: compare a bundle against a destination without touching either

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::link::{self, absolutize, is_link_to, link_target, links_supported};
use super::SyncError;
use crate::config::{CustomizableEntry, Placement, SyncConfig};

pub(crate) const ALREADY_EXISTS: &str = "already exists";
pub(crate) const ALREADY_LINKED: &str = "already linked";
pub(crate) const NO_LINK_SUPPORT: &str = "platform lacks link capability";

/// One filesystem operation in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    EnsureDir {
        path: PathBuf,
    },
    /// Symlink `dest` to `source`, storing `target` as the link text
    LinkShared {
        source: PathBuf,
        dest: PathBuf,
        target: PathBuf,
    },
    /// Copy `source` to `dest` unless `dest` already exists
    PlaceCustomizable {
        source: PathBuf,
        dest: PathBuf,
    },
    Skip {
        path: PathBuf,
        reason: String,
    },
    /// Remove an orphaned link into the bundle (only with pruning enabled)
    RemoveStale {
        path: PathBuf,
    },
}

impl Operation {
    /// Destination path this operation acts on
    pub fn path(&self) -> &Path {
        match self {
            Self::EnsureDir { path } | Self::Skip { path, .. } | Self::RemoveStale { path } => {
                path
            }
            Self::LinkShared { dest, .. } | Self::PlaceCustomizable { dest, .. } => dest,
        }
    }

    /// Short label used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EnsureDir { .. } => "mkdir",
            Self::LinkShared { .. } => "link",
            Self::PlaceCustomizable { .. } => "copy",
            Self::Skip { .. } => "skip",
            Self::RemoveStale { .. } => "prune",
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    fn skip(path: PathBuf, reason: &str) -> Self {
        Self::Skip {
            path,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnsureDir { path } => write!(f, "mkdir {}", path.display()),
            Self::LinkShared { dest, target, .. } => {
                write!(f, "link {} -> {}", dest.display(), target.display())
            }
            Self::PlaceCustomizable { source, dest } => {
                write!(f, "copy {} -> {}", source.display(), dest.display())
            }
            Self::Skip { path, reason } => write!(f, "skip {} ({})", path.display(), reason),
            Self::RemoveStale { path } => write!(f, "prune {}", path.display()),
        }
    }
}

/// Ordered operations reconciling a destination with a bundle
#[derive(Debug, Clone, Serialize)]
pub struct SyncPlan {
    pub bundle_root: PathBuf,
    pub dest_root: PathBuf,
    pub operations: Vec<Operation>,
}

impl SyncPlan {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// True when applying would change nothing
    pub fn is_noop(&self) -> bool {
        self.operations.iter().all(Operation::is_skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }
}

/// Plan ops bucketed by class, each keyed by bundle-relative path
#[derive(Default)]
struct Buckets {
    dirs: Vec<(String, Operation)>,
    files: Vec<(String, Operation)>,
    units: Vec<(String, Operation)>,
    prune: Vec<(String, Operation)>,
}

impl Buckets {
    fn into_operations(self) -> Vec<Operation> {
        let mut operations = Vec::new();
        for mut class in [self.dirs, self.files, self.units, self.prune] {
            class.sort_by(|a, b| a.0.cmp(&b.0));
            operations.extend(class.into_iter().map(|(_, op)| op));
        }
        operations
    }
}

/// Compute the operations needed to bring `dest_root` in line with `bundle_root`
///
/// Fails with [`SyncError::SourceNotFound`] if the bundle is missing or
/// unreadable. Never writes to disk.
pub fn plan(
    bundle_root: &Path,
    dest_root: &Path,
    config: &SyncConfig,
) -> Result<SyncPlan, SyncError> {
    let source_missing = || SyncError::SourceNotFound {
        path: bundle_root.to_path_buf(),
    };
    let bundle = absolutize(bundle_root).map_err(|_| source_missing())?;
    if !bundle.is_dir() || fs::read_dir(&bundle).is_err() {
        return Err(source_missing());
    }
    let dest = absolutize(dest_root).map_err(|e| SyncError::io("resolve", dest_root, e))?;

    tracing::debug!(bundle = %bundle.display(), dest = %dest.display(), "planning sync");

    let mut buckets = Buckets::default();

    if fs::symlink_metadata(&dest).is_err() {
        buckets
            .dirs
            .push((String::new(), Operation::EnsureDir { path: dest.clone() }));
    }

    for tree in &config.tree_dirs {
        plan_tree(&bundle, &dest, tree, config, &mut buckets)?;
    }

    for entry in &config.customizable {
        if is_under_any(&entry.path, &config.tree_dirs) {
            continue;
        }
        if is_under_any(&entry.path, &config.unit_dirs) {
            tracing::warn!(path = %entry.path, "customizable entry inside a linked directory is ignored");
            continue;
        }
        let source = bundle.join(&entry.path);
        if fs::symlink_metadata(&source).is_err() {
            tracing::debug!(path = %entry.path, "customizable entry not in bundle");
            continue;
        }
        let op = customizable_op(source, customizable_dest(&dest, entry), &dest);
        buckets.files.push((entry.path.clone(), op));
    }

    for unit in &config.unit_dirs {
        let source = bundle.join(unit);
        if !source.exists() {
            tracing::debug!(unit = %unit, "unit directory not in bundle");
            continue;
        }
        let op = shared_op(source, dest.join(unit), config);
        buckets.units.push((unit.clone(), op));
    }

    if config.prune {
        plan_prune(&bundle, &dest, config, &mut buckets);
    }

    let operations = buckets.into_operations();
    for op in &operations {
        tracing::debug!(op = %op, "planned");
    }

    Ok(SyncPlan {
        bundle_root: bundle,
        dest_root: dest,
        operations,
    })
}

/// Walk a per-file subtree, emitting directory and file operations
fn plan_tree(
    bundle: &Path,
    dest: &Path,
    tree: &str,
    config: &SyncConfig,
    buckets: &mut Buckets,
) -> Result<(), SyncError> {
    let root = bundle.join(tree);
    if !root.is_dir() {
        tracing::debug!(tree = %tree, "tree directory not in bundle");
        return Ok(());
    }

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(&root).to_path_buf();
            SyncError::io("read", &path, e.into())
        })?;
        let source = entry.path().to_path_buf();
        let rel = relative_key(bundle, &source);
        let dest_path = dest.join(&rel);

        if entry.file_type().is_dir() {
            // A symlink here or above would send writes to wherever it points
            let is_dir = fs::symlink_metadata(&dest_path)
                .map(|m| m.is_dir())
                .unwrap_or(false)
                && !behind_link(dest, &dest_path);
            let op = if is_dir {
                Operation::skip(dest_path, ALREADY_EXISTS)
            } else {
                Operation::EnsureDir { path: dest_path }
            };
            buckets.dirs.push((rel, op));
        } else if let Some(custom) = config.customizable_entry(&rel) {
            let op = customizable_op(source, customizable_dest(dest, custom), dest);
            buckets.files.push((rel, op));
        } else {
            let op = shared_op(source, dest_path, config);
            buckets.files.push((rel, op));
        }
    }

    Ok(())
}

/// Find links the engine left behind whose bundle entry is gone
fn plan_prune(bundle: &Path, dest: &Path, config: &SyncConfig, buckets: &mut Buckets) {
    let points_into_bundle =
        |path: &Path| link::resolved_target(path).is_some_and(|t| t.starts_with(bundle));

    for tree in &config.tree_dirs {
        let root = dest.join(tree);
        let is_real_dir = fs::symlink_metadata(&root)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_real_dir {
            continue;
        }

        for entry in WalkDir::new(&root).follow_links(false).into_iter().flatten() {
            if !entry.path_is_symlink() {
                continue;
            }
            let rel = relative_key(dest, entry.path());
            let orphaned = fs::symlink_metadata(bundle.join(&rel)).is_err();
            if orphaned && points_into_bundle(entry.path()) {
                buckets.prune.push((
                    rel,
                    Operation::RemoveStale {
                        path: entry.path().to_path_buf(),
                    },
                ));
            }
        }
    }

    for unit in &config.unit_dirs {
        let path = dest.join(unit);
        if bundle.join(unit).exists() || !link::is_symlink(&path) {
            continue;
        }
        if points_into_bundle(&path) {
            buckets
                .prune
                .push((unit.clone(), Operation::RemoveStale { path }));
        }
    }
}

fn shared_op(source: PathBuf, dest: PathBuf, config: &SyncConfig) -> Operation {
    if !links_supported() {
        return Operation::skip(dest, NO_LINK_SUPPORT);
    }
    let target = link_target(&source, &dest, config.link_style);
    if is_link_to(&dest, &target) {
        Operation::skip(dest, ALREADY_LINKED)
    } else {
        Operation::LinkShared {
            source,
            dest,
            target,
        }
    }
}

fn customizable_op(source: PathBuf, dest: PathBuf, root: &Path) -> Operation {
    // A dangling link still counts as the project's own entry; one reached
    // through a linked parent directory does not
    if fs::symlink_metadata(&dest).is_ok() && !behind_link(root, &dest) {
        Operation::skip(dest, ALREADY_EXISTS)
    } else {
        Operation::PlaceCustomizable { source, dest }
    }
}

fn customizable_dest(dest: &Path, entry: &CustomizableEntry) -> PathBuf {
    match entry.placement {
        Placement::Config => dest.join(&entry.path),
        Placement::Project => {
            let name = Path::new(&entry.path)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&entry.path));
            match dest.parent() {
                Some(project) => project.join(name),
                None => dest.join(name),
            }
        }
    }
}

/// True if a directory between `root` and `path` is a symlink
fn behind_link(root: &Path, path: &Path) -> bool {
    path.ancestors()
        .skip(1)
        .take_while(|a| *a != root && a.starts_with(root))
        .any(link::is_symlink)
}

/// `/`-separated path of `path` relative to `base`
fn relative_key(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_under_any(rel: &str, dirs: &[String]) -> bool {
    dirs.iter().any(|dir| {
        rel == dir
            || rel
                .strip_prefix(dir.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
