//! Single-entry file and directory operations.
//!
//! Everything here acts on exactly one entry (or a source/destination
//! pair): create, delete, copy, rename, list, search, metadata, working
//! directory changes, and handing a file to the OS default application.
//! Paths are taken as given and resolve against the process's current
//! working directory; recursion and policy live in [`crate::tree`].

use crate::error::VaultError;
use crate::fs_ops::{self, EntryKind};
use crate::metadata::EntryReport;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Create an empty file, leaving an existing one untouched.
pub async fn create_file(path: &Path) -> Result<(), VaultError> {
    debug!(path = %path.display(), "creating file");
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .await
        .map_err(|e| VaultError::from_io(path, e))?;
    info!(path = %path.display(), "file created");
    Ok(())
}

/// Unlink a single file.
pub async fn delete_file(path: &Path) -> Result<(), VaultError> {
    fs_ops::remove_file(path).await?;
    info!(path = %path.display(), "file deleted");
    Ok(())
}

/// Copy `src` to `dst`, overwriting `dst` if it exists.
/// Returns the number of bytes copied.
pub async fn copy_file(src: &Path, dst: &Path) -> Result<u64, VaultError> {
    let bytes = fs::copy(src, dst)
        .await
        .map_err(|e| VaultError::from_io(src, e))?;
    info!(src = %src.display(), dst = %dst.display(), bytes, "file copied");
    Ok(bytes)
}

/// Rename (or move) an entry. Files and directories share rename(2)
/// semantics, so one operation covers `move`, `rename`, and `renamedir`.
pub async fn rename_entry(old: &Path, new: &Path) -> Result<(), VaultError> {
    fs::rename(old, new)
        .await
        .map_err(|e| VaultError::from_io(old, e))?;
    info!(old = %old.display(), new = %new.display(), "entry renamed");
    Ok(())
}

/// Create a single directory (parent must exist).
pub async fn create_dir(path: &Path) -> Result<(), VaultError> {
    fs::create_dir(path)
        .await
        .map_err(|e| VaultError::from_io(path, e))?;
    info!(path = %path.display(), "directory created");
    Ok(())
}

/// Immediate children of a directory as `(name, kind)` pairs.
pub async fn list_dir(path: &Path) -> Result<Vec<(String, EntryKind)>, VaultError> {
    let children = fs_ops::list_children(path).await?;
    Ok(children
        .into_iter()
        .map(|(name, kind)| (name.to_string_lossy().into_owned(), kind))
        .collect())
}

/// Immediate children of `path` whose names contain `needle`.
pub async fn search(path: &Path, needle: &str) -> Result<Vec<(PathBuf, EntryKind)>, VaultError> {
    let children = fs_ops::list_children(path).await?;
    let matches: Vec<(PathBuf, EntryKind)> = children
        .into_iter()
        .filter(|(name, _)| name.to_string_lossy().contains(needle))
        .map(|(name, kind)| (path.join(name), kind))
        .collect();
    debug!(path = %path.display(), needle, hits = matches.len(), "search complete");
    Ok(matches)
}

/// Metadata snapshot of one entry.
pub async fn entry_report(path: &Path) -> Result<EntryReport, VaultError> {
    EntryReport::gather(path).await
}

/// Change the process working directory. Relative paths in later commands
/// resolve against the new directory.
pub fn change_dir(path: &Path) -> Result<(), VaultError> {
    std::env::set_current_dir(path).map_err(|e| VaultError::from_io(path, e))?;
    info!(path = %path.display(), "working directory changed");
    Ok(())
}

/// Hand a file to the OS default application for its type.
pub fn open_with_default(path: &Path) -> Result<(), VaultError> {
    open::that(path).map_err(|e| VaultError::from_io(path, e))?;
    info!(path = %path.display(), "opened with default application");
    Ok(())
}
