//! Symlink helpers
//!
//! Links are created under a temporary name next to the destination and
//! renamed into place, so a reader never observes a missing entry while a
//! stale link is being refreshed.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use super::SyncError;
use crate::config::LinkStyle;

/// Whether this platform can create symlinks at all
pub fn links_supported() -> bool {
    cfg!(any(unix, windows))
}

/// The target to write into a link at `dest` pointing to `source`
pub(crate) fn link_target(source: &Path, dest: &Path, style: LinkStyle) -> PathBuf {
    match style {
        LinkStyle::Absolute => source.to_path_buf(),
        LinkStyle::Relative => dest
            .parent()
            .and_then(|base| pathdiff::diff_paths(source, base))
            .unwrap_or_else(|| source.to_path_buf()),
    }
}

/// True if `dest` is a symlink whose stored target is exactly `target`
pub(crate) fn is_link_to(dest: &Path, target: &Path) -> bool {
    match fs::read_link(dest) {
        Ok(current) => current == target,
        Err(_) => false,
    }
}

pub(crate) fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Where a symlink points, resolved against its parent but not followed
pub(crate) fn resolved_target(link: &Path) -> Option<PathBuf> {
    let target = fs::read_link(link).ok()?;
    let joined = if target.is_absolute() {
        target
    } else {
        link.parent()?.join(target)
    };
    Some(clean_path(&joined))
}

/// Resolve `.` and `..` lexically, without following symlinks
pub(crate) fn clean_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other),
        }
    }
    result
}

/// Make `path` absolute; existing prefixes are canonicalized so they compare
/// equal to canonicalized bundle paths
pub(crate) fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(strip_windows_prefix(&canonical));
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let absolute = clean_path(&absolute);

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) if parent != absolute => Ok(absolutize(parent)?.join(name)),
        _ => Ok(absolute),
    }
}

/// Strip Windows extended-length path prefix (\\?\)
fn strip_windows_prefix(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    match path_str.strip_prefix(r"\\?\") {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

/// Point `dest` at `target`, replacing whatever file or link is there. A
/// directory is replaced only if it holds nothing but links into `bundle`
/// (what an earlier per-file sync leaves behind); anything else is a
/// conflict.
pub(crate) fn replace_with_link(
    source: &Path,
    dest: &Path,
    target: &Path,
    bundle: &Path,
) -> Result<(), SyncError> {
    if let Ok(meta) = fs::symlink_metadata(dest) {
        if meta.is_dir() {
            if !is_owned_dir(dest, bundle) {
                return Err(SyncError::DestinationConflict {
                    path: dest.to_path_buf(),
                });
            }
            fs::remove_dir_all(dest).map_err(|e| SyncError::io("remove", dest, e))?;
        }
    }

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dest.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

    create_symlink(target, &temp, source.is_dir()).map_err(|e| SyncError::io("link", dest, e))?;

    if let Err(e) = rename_over(&temp, dest) {
        let _ = remove_link(&temp);
        return Err(SyncError::io("link", dest, e));
    }
    Ok(())
}

/// Make `path` a real directory. A symlink in its place is swapped for one
/// when it dangles or points into `bundle`; a link elsewhere is a conflict.
pub(crate) fn ensure_real_dir(path: &Path, bundle: &Path) -> Result<(), SyncError> {
    if is_symlink(path) {
        let dangling = fs::metadata(path).is_err();
        let into_bundle = resolved_target(path).is_some_and(|t| t.starts_with(bundle));
        if !dangling && !into_bundle {
            return Err(SyncError::DestinationConflict {
                path: path.to_path_buf(),
            });
        }
        remove_link(path).map_err(|e| SyncError::io("remove", path, e))?;
    }

    fs::create_dir_all(path).map_err(|e| SyncError::io("create", path, e))
}

/// True if every entry under `dir` is a directory or a link into `bundle`
pub(crate) fn is_owned_dir(dir: &Path, bundle: &Path) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .all(|entry| match entry {
            Ok(entry) if entry.path_is_symlink() => {
                resolved_target(entry.path()).is_some_and(|t| t.starts_with(bundle))
            }
            Ok(entry) => entry.file_type().is_dir(),
            Err(_) => false,
        })
}

/// Refuse writes whose parent resolves into the bundle, e.g. through a
/// symlinked destination directory
pub(crate) fn ensure_outside_bundle(path: &Path, bundle: &Path) -> Result<(), SyncError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let resolved = absolutize(parent).map_err(|e| SyncError::io("resolve", parent, e))?;
    if resolved.starts_with(bundle) {
        return Err(SyncError::InsideBundle {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Remove a symlink (file or directory flavored)
pub(crate) fn remove_link(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        // Windows directory symlinks need remove_dir
        Err(_) if cfg!(windows) => fs::remove_dir(path),
        Err(e) => Err(e),
    }
}

#[cfg(not(windows))]
fn rename_over(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

#[cfg(windows)]
fn rename_over(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) if is_symlink(to) || to.is_file() => {
            remove_link(to)?;
            fs::rename(from, to)
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path, _is_dir: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path, _is_dir: bool) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
