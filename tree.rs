//! Recursive directory-tree removal.
//!
//! [`TreeRemover`] deletes a directory subtree through a two-phase protocol:
//! [`TreeRemover::check_removable`] inspects without side effects, the caller
//! confirms if the directory is non-empty, then [`TreeRemover::execute`]
//! performs a depth-first post-order walk that empties every directory
//! before removing the directory itself.
//!
//! The walk uses an explicit frame stack rather than native recursion, so
//! pathological nesting hits the configured depth ceiling and reports a
//! partial failure instead of overflowing the call stack. Symlinks are
//! unlinked as leaf entries and never followed.

use crate::error::ErrorKind;
use crate::fs_ops::{self, EntryKind};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Depth ceiling applied when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Result of a removal check or execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The subtree is gone (or, from a check, trivially removable).
    Removed,
    /// The directory has children; nothing was deleted. The caller decides
    /// whether to re-run with `forced = true`.
    NotEmptyNeedsConfirmation,
    /// The path does not exist.
    NotFound,
    /// The path exists but is not a directory (symlinks included).
    NotADirectory,
    /// The walk aborted at the first entry it could not remove. Entries
    /// deleted before this point stay deleted.
    PartialFailure { kind: ErrorKind, path: PathBuf },
}

/// One in-progress directory during the walk: its path plus the children
/// not yet visited.
struct Frame {
    path: PathBuf,
    children: std::vec::IntoIter<(OsString, EntryKind)>,
}

pub struct TreeRemover {
    max_depth: usize,
}

impl Default for TreeRemover {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeRemover {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Inspect whether `path` can be removed without confirmation.
    ///
    /// Never deletes anything: a non-empty directory yields
    /// [`RemovalOutcome::NotEmptyNeedsConfirmation`] and the tree is left
    /// exactly as found, no matter how often this is called.
    pub async fn check_removable(&self, path: &Path) -> RemovalOutcome {
        match self.snapshot(path).await {
            Ok(children) if children.is_empty() => RemovalOutcome::Removed,
            Ok(_) => RemovalOutcome::NotEmptyNeedsConfirmation,
            Err(outcome) => outcome,
        }
    }

    /// Remove the subtree rooted at `path`.
    ///
    /// With `forced = false` a non-empty directory is left untouched and
    /// reported as needing confirmation, mirroring [`Self::check_removable`].
    /// Otherwise every descendant is deleted child-before-parent and the
    /// root goes last. The first failure aborts the rest of the walk;
    /// deletion is not transactional.
    pub async fn execute(&self, path: &Path, forced: bool) -> RemovalOutcome {
        let children = match self.snapshot(path).await {
            Ok(children) => children,
            Err(outcome) => return outcome,
        };

        if !forced && !children.is_empty() {
            debug!(path = %path.display(), "directory not empty, confirmation required");
            return RemovalOutcome::NotEmptyNeedsConfirmation;
        }

        let mut stack = vec![Frame {
            path: path.to_path_buf(),
            children: children.into_iter(),
        }];

        loop {
            // Take the next unvisited child of the deepest open directory;
            // None means that directory is now empty.
            let next = match stack.last_mut() {
                Some(frame) => {
                    let parent = frame.path.clone();
                    frame.children.next().map(|child| (parent, child))
                }
                None => break,
            };

            match next {
                Some((parent, (name, EntryKind::Directory))) => {
                    let child = parent.join(name);
                    if stack.len() >= self.max_depth {
                        warn!(path = %child.display(), limit = self.max_depth, "tree walk hit depth ceiling");
                        return RemovalOutcome::PartialFailure {
                            kind: ErrorKind::DepthLimitExceeded,
                            path: child,
                        };
                    }
                    let grandchildren = match fs_ops::list_children(&child).await {
                        Ok(c) => c,
                        Err(e) => {
                            return RemovalOutcome::PartialFailure {
                                kind: e.kind(),
                                path: child,
                            }
                        }
                    };
                    stack.push(Frame {
                        path: child,
                        children: grandchildren.into_iter(),
                    });
                }
                Some((parent, (name, _))) => {
                    // Files, symlinks, and anything else are unlinked as
                    // leaves; links are never followed into their targets.
                    let child = parent.join(name);
                    if let Err(e) = fs_ops::remove_file(&child).await {
                        return RemovalOutcome::PartialFailure {
                            kind: e.kind(),
                            path: child,
                        };
                    }
                }
                None => {
                    if let Some(done) = stack.pop() {
                        if let Err(e) = fs_ops::remove_empty_dir(&done.path).await {
                            return RemovalOutcome::PartialFailure {
                                kind: e.kind(),
                                path: done.path,
                            };
                        }
                    }
                }
            }
        }

        info!(path = %path.display(), "directory tree removed");
        RemovalOutcome::Removed
    }

    /// Stat the root and snapshot its immediate children, translating
    /// failures into the outcomes both public operations share.
    async fn snapshot(&self, path: &Path) -> Result<Vec<(OsString, EntryKind)>, RemovalOutcome> {
        let kind = match fs_ops::stat(path).await {
            Ok(kind) => kind,
            Err(e) => {
                return Err(match e.kind() {
                    ErrorKind::NotFound => RemovalOutcome::NotFound,
                    ErrorKind::NotADirectory => RemovalOutcome::NotADirectory,
                    other => RemovalOutcome::PartialFailure {
                        kind: other,
                        path: path.to_path_buf(),
                    },
                })
            }
        };

        if kind != EntryKind::Directory {
            return Err(RemovalOutcome::NotADirectory);
        }

        fs_ops::list_children(path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RemovalOutcome::NotFound,
                ErrorKind::NotADirectory => RemovalOutcome::NotADirectory,
                other => RemovalOutcome::PartialFailure {
                    kind: other,
                    path: path.to_path_buf(),
                },
            })
    }
}
