//! Numbered project snapshots
//!
//! Before anything is modified the whole project directory is copied to a
//! sibling directory named `.__p2r_backup_<project>_<index>`. Indices grow
//! monotonically per project name, so snapshots never collide and the most
//! recent one is the one with the highest index.

use crate::error::IoError;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Prefix of every backup directory name
pub const BACKUP_PREFIX: &str = ".__p2r_backup_";

static BACKUP_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.__p2r_backup_(.+)_(\d+)$").unwrap());

/// Split a backup directory name into `(project_name, index)`
pub fn parse_backup_name(name: &str) -> Option<(&str, u64)> {
    let caps = BACKUP_NAME_RE.captures(name)?;
    let project = caps.get(1)?.as_str();
    let index = caps.get(2)?.as_str().parse().ok()?;
    Some((project, index))
}

/// Directory name of the project, used to tag its backups
fn project_name(project: &Path) -> Result<String, IoError> {
    project
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| IoError::directory_not_found(project))
}

fn parent_dir(project: &Path) -> &Path {
    project.parent().unwrap_or_else(|| Path::new("."))
}

/// Path of backup `index` for `project`
pub fn backup_path(project: &Path, index: u64) -> Result<PathBuf, IoError> {
    let name = project_name(project)?;
    Ok(parent_dir(project).join(format!("{BACKUP_PREFIX}{name}_{index}")))
}

/// Highest existing backup index for `project`, if any
pub fn latest_slot(project: &Path) -> Result<Option<u64>, IoError> {
    let name = project_name(project)?;
    let parent = parent_dir(project);
    let entries = fs::read_dir(parent).map_err(|e| IoError::generic(parent, e))?;

    let mut latest = None;
    for entry in entries {
        let entry = entry.map_err(|e| IoError::generic(parent, e))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        match parse_backup_name(&file_name) {
            Some((owner, index)) if owner == name => latest = latest.max(Some(index)),
            _ => {}
        }
    }
    Ok(latest)
}

/// Path of the next unused backup slot: one past the highest index, or 0
pub fn next_slot(project: &Path) -> Result<PathBuf, IoError> {
    let index = latest_slot(project)?.map_or(0, |latest| latest + 1);
    backup_path(project, index)
}

/// Copy the project to its next backup slot and return the backup path
pub fn create_backup(project: &Path) -> Result<PathBuf, IoError> {
    if !project.is_dir() {
        return Err(IoError::directory_not_found(project));
    }
    let backup = next_slot(project)?;
    let files = copy_tree(project, &backup)?;
    tracing::debug!(
        backup = %backup.display(),
        files,
        "created backup"
    );
    Ok(backup)
}

/// Replace the project directory with a copy of `backup`.
///
/// The backup itself is left in place.
pub fn restore_backup(project: &Path, backup: &Path) -> Result<(), IoError> {
    if !backup.is_dir() {
        return Err(IoError::directory_not_found(backup));
    }
    if project.exists() {
        fs::remove_dir_all(project).map_err(|e| IoError::generic(project, e))?;
    }
    let files = copy_tree(backup, project)?;
    tracing::debug!(
        backup = %backup.display(),
        files,
        "restored backup"
    );
    Ok(())
}

/// Recursively copy `from` into `to`, keeping symbolic links as links.
///
/// Returns the number of files and links copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, IoError> {
    let mut copied = 0;
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            IoError::generic(path, io::Error::from(e))
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| IoError::generic(&target, e))?;
            continue;
        }
        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| IoError::generic(&target, e))?;
        }
        copied += 1;
    }
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), IoError> {
    let destination = fs::read_link(link).map_err(|e| IoError::generic(link, e))?;
    std::os::unix::fs::symlink(&destination, target).map_err(|e| IoError::generic(target, e))
}

#[cfg(windows)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), IoError> {
    let destination = fs::read_link(link).map_err(|e| IoError::generic(link, e))?;
    let points_to_dir = fs::metadata(link).map(|m| m.is_dir()).unwrap_or(false);
    let created = if points_to_dir {
        std::os::windows::fs::symlink_dir(&destination, target)
    } else {
        std::os::windows::fs::symlink_file(&destination, target)
    };
    created.map_err(|e| IoError::generic(target, e))
}
