//! Filesystem access layer.
//!
//! Thin adapter over single filesystem entries: stat, list, remove, and
//! scoped in-place rewrite. Every operation reports a structured
//! [`VaultError`] instead of a raw OS code, and none of them recurses or
//! applies policy; the tree remover and cipher transform are built on this
//! contract alone.

use crate::error::VaultError;
use serde::Serialize;
use std::ffi::OsString;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

/// What a filesystem entry is, from a symlink-aware stat.
///
/// A symlink reports as [`EntryKind::Symlink`] regardless of what it points
/// at; no operation in this layer follows links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    pub(crate) fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            Self::Symlink
        } else if ft.is_dir() {
            Self::Directory
        } else if ft.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Stat a single entry without following symlinks.
pub async fn stat(path: &Path) -> Result<EntryKind, VaultError> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| VaultError::from_io(path, e))?;
    Ok(EntryKind::from_file_type(meta.file_type()))
}

/// List the immediate children of a directory as `(name, kind)` pairs.
///
/// Order is whatever the OS enumerates; nothing is cached, so every call
/// observes the directory's current contents.
pub async fn list_children(path: &Path) -> Result<Vec<(OsString, EntryKind)>, VaultError> {
    let mut dir = fs::read_dir(path)
        .await
        .map_err(|e| VaultError::from_io(path, e))?;

    let mut children = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| VaultError::from_io(path, e))?
    {
        let kind = match entry.file_type().await {
            Ok(ft) => EntryKind::from_file_type(ft),
            Err(_) => EntryKind::Other,
        };
        children.push((entry.file_name(), kind));
    }
    Ok(children)
}

/// Unlink a single file or symlink. Never follows the link.
pub async fn remove_file(path: &Path) -> Result<(), VaultError> {
    debug!(path = %path.display(), "removing file");
    fs::remove_file(path)
        .await
        .map_err(|e| VaultError::from_io(path, e))
}

/// Remove a directory that must already be empty.
pub async fn remove_empty_dir(path: &Path) -> Result<(), VaultError> {
    debug!(path = %path.display(), "removing empty directory");
    fs::remove_dir(path)
        .await
        .map_err(|e| VaultError::from_io(path, e))
}

/// Open a file for in-place rewriting.
///
/// The returned handle reads and writes at the same byte offsets. Dropping
/// it closes the file on every exit path, including errors.
pub async fn open_rewrite(path: &Path) -> Result<RewriteHandle, VaultError> {
    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .await
        .map_err(|e| VaultError::from_io(path, e))?;
    Ok(RewriteHandle {
        file,
        path: path.to_path_buf(),
    })
}

/// Scoped handle for random-access read and write at identical offsets.
pub struct RewriteHandle {
    file: fs::File,
    path: PathBuf,
}

impl RewriteHandle {
    /// Current file length in bytes.
    pub async fn len(&self) -> Result<u64, VaultError> {
        let meta = self
            .file
            .metadata()
            .await
            .map_err(|e| VaultError::from_io(&self.path, e))?;
        Ok(meta.len())
    }

    /// Read from `offset`, filling as much of `buf` as the file provides.
    /// Returns the number of bytes read; 0 means end of file.
    pub async fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, VaultError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| VaultError::from_io(&self.path, e))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .file
                .read(&mut buf[filled..])
                .await
                .map_err(|e| VaultError::from_io(&self.path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Write `buf` back at `offset`, the same position it was read from.
    pub async fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), VaultError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| VaultError::from_io(&self.path, e))?;
        self.file
            .write_all(buf)
            .await
            .map_err(|e| VaultError::from_io(&self.path, e))?;
        Ok(())
    }

    /// Flush buffered writes to the OS.
    pub async fn flush(&mut self) -> Result<(), VaultError> {
        self.file
            .flush()
            .await
            .map_err(|e| VaultError::from_io(&self.path, e))
    }
}
