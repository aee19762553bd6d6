use crate::error::VaultError;
use crate::fs_ops::EntryKind;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use tokio::fs;

/// Metadata snapshot of a single filesystem entry.
#[derive(Debug, Serialize)]
pub struct EntryReport {
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
    /// Unix permission bits (low 9 bits), absent on other platforms
    pub mode: Option<u32>,
    pub modified: Option<DateTime<Local>>,
}

impl EntryReport {
    pub async fn gather(path: &Path) -> Result<Self, VaultError> {
        let meta = fs::symlink_metadata(path)
            .await
            .map_err(|e| VaultError::from_io(path, e))?;

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(meta.permissions().mode() & 0o777)
        };
        #[cfg(not(unix))]
        let mode = None;

        Ok(Self {
            path: path.display().to_string(),
            kind: EntryKind::from_file_type(meta.file_type()),
            size: meta.len(),
            mode,
            modified: meta.modified().ok().map(DateTime::<Local>::from),
        })
    }
}
