use anyhow::Result;
use std::fs;
use tempfile::TempDir;

use vaultfs::cipher::StreamTransformer;
use vaultfs::error::ErrorKind;
use vaultfs::file_ops;
use vaultfs::fs_ops::{self, EntryKind};
use vaultfs::tree::{RemovalOutcome, TreeRemover};
use vaultfs::VaultError;

/// Root bypasses permission bits, which would void the denied-removal
/// scenarios below. Detected by the ownership of a file we just created.
#[cfg(unix)]
fn running_as_root() -> bool {
    use std::os::unix::fs::MetadataExt;
    let probe = std::env::temp_dir().join(format!("vaultfs-uid-probe-{}", std::process::id()));
    let owned_by_root = fs::write(&probe, b"")
        .and_then(|_| fs::metadata(&probe))
        .map(|m| m.uid() == 0)
        .unwrap_or(false);
    let _ = fs::remove_file(&probe);
    owned_by_root
}

/// Build the reference tree from the removal contract:
/// root/b/file1, root/c/file2, root/file3
fn build_sample_tree(tmp: &TempDir) -> std::path::PathBuf {
    let root = tmp.path().join("a");
    fs::create_dir(&root).expect("create root");
    fs::create_dir(root.join("b")).expect("create b");
    fs::create_dir(root.join("c")).expect("create c");
    fs::write(root.join("b").join("file1"), b"one").expect("write file1");
    fs::write(root.join("c").join("file2"), b"two").expect("write file2");
    fs::write(root.join("file3"), b"three").expect("write file3");
    root
}

#[tokio::test]
async fn tree_post_order_completeness() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = build_sample_tree(&tmp);

    let remover = TreeRemover::new();
    let outcome = remover.execute(&root, true).await;
    assert_eq!(outcome, RemovalOutcome::Removed);

    // Everything under the root, and the root itself, is gone
    let result = fs_ops::stat(&root).await;
    assert!(matches!(result, Err(VaultError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn tree_check_is_non_destructive() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = build_sample_tree(&tmp);

    let remover = TreeRemover::new();
    for _ in 0..3 {
        let outcome = remover.check_removable(&root).await;
        assert_eq!(outcome, RemovalOutcome::NotEmptyNeedsConfirmation);
    }

    // All original entries still present
    assert!(root.join("b").join("file1").exists());
    assert!(root.join("c").join("file2").exists());
    assert!(root.join("file3").exists());
    Ok(())
}

#[tokio::test]
async fn tree_unforced_abort_on_non_empty() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = build_sample_tree(&tmp);

    let remover = TreeRemover::new();
    let outcome = remover.execute(&root, false).await;
    assert_eq!(outcome, RemovalOutcome::NotEmptyNeedsConfirmation);

    assert!(root.join("b").join("file1").exists());
    assert!(root.join("c").join("file2").exists());
    assert!(root.join("file3").exists());
    Ok(())
}

#[tokio::test]
async fn tree_empty_dir_shortcut() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("empty");
    fs::create_dir(&root)?;

    let remover = TreeRemover::new();
    assert_eq!(remover.check_removable(&root).await, RemovalOutcome::Removed);
    assert_eq!(remover.execute(&root, false).await, RemovalOutcome::Removed);
    assert!(!root.exists());
    Ok(())
}

#[tokio::test]
async fn tree_missing_and_non_directory_roots() -> Result<()> {
    let tmp = TempDir::new()?;
    let remover = TreeRemover::new();

    let missing = tmp.path().join("missing");
    assert_eq!(remover.check_removable(&missing).await, RemovalOutcome::NotFound);
    assert_eq!(remover.execute(&missing, true).await, RemovalOutcome::NotFound);

    let file = tmp.path().join("plain.txt");
    fs::write(&file, b"data")?;
    assert_eq!(remover.check_removable(&file).await, RemovalOutcome::NotADirectory);
    assert_eq!(remover.execute(&file, true).await, RemovalOutcome::NotADirectory);
    assert!(file.exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn tree_symlink_root_is_not_a_directory() -> Result<()> {
    use std::os::unix::fs::symlink;

    let tmp = TempDir::new()?;
    let target = tmp.path().join("target");
    fs::create_dir(&target)?;
    fs::write(target.join("keep.txt"), b"keep")?;

    let link = tmp.path().join("link");
    symlink(&target, &link)?;

    let remover = TreeRemover::new();
    assert_eq!(remover.execute(&link, true).await, RemovalOutcome::NotADirectory);
    assert!(target.join("keep.txt").exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn tree_symlinks_removed_as_leaves() -> Result<()> {
    use std::os::unix::fs::symlink;

    let tmp = TempDir::new()?;
    let outside = tmp.path().join("outside");
    fs::create_dir(&outside)?;
    fs::write(outside.join("keep.txt"), b"keep")?;

    let root = tmp.path().join("doomed");
    fs::create_dir(&root)?;
    symlink(&outside, root.join("escape"))?;
    fs::write(root.join("file"), b"x")?;

    let remover = TreeRemover::new();
    assert_eq!(remover.execute(&root, true).await, RemovalOutcome::Removed);

    // The link was unlinked, never followed: the target survives intact
    assert!(!root.exists());
    assert!(outside.join("keep.txt").exists());
    Ok(())
}

/// The walk empties a directory before removing it, so a failure on the
/// final rmdir is observed only after every child is gone. Making the
/// root's parent unwritable forces exactly that: children unlink fine,
/// the root itself cannot be removed.
#[cfg(unix)]
#[tokio::test]
async fn tree_partial_failure_keeps_removed_entries_removed() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new()?;
    let outer = tmp.path().join("outer");
    fs::create_dir(&outer)?;
    let root = outer.join("victim");
    fs::create_dir(&root)?;
    fs::create_dir(root.join("sub"))?;
    fs::write(root.join("sub").join("file1"), b"one")?;
    fs::write(root.join("file2"), b"two")?;

    if running_as_root() {
        return Ok(()); // permission bits do not constrain root
    }
    fs::set_permissions(&outer, fs::Permissions::from_mode(0o555))?;

    let remover = TreeRemover::new();
    let outcome = remover.execute(&root, true).await;

    fs::set_permissions(&outer, fs::Permissions::from_mode(0o755))?;

    assert_eq!(
        outcome,
        RemovalOutcome::PartialFailure {
            kind: ErrorKind::PermissionDenied,
            path: root.clone(),
        }
    );

    // No rollback: the subtree was removed before the failure
    assert!(root.exists());
    assert!(!root.join("sub").exists());
    assert!(!root.join("file2").exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn tree_partial_failure_on_unreadable_subdir() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new()?;
    let root = tmp.path().join("a");
    fs::create_dir(&root)?;
    let locked = root.join("locked");
    fs::create_dir(&locked)?;
    if running_as_root() {
        return Ok(()); // permission bits do not constrain root
    }
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    let remover = TreeRemover::new();
    let outcome = remover.execute(&root, true).await;

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

    assert_eq!(
        outcome,
        RemovalOutcome::PartialFailure {
            kind: ErrorKind::PermissionDenied,
            path: locked.clone(),
        }
    );

    // The failing entry and everything above it remain
    assert!(locked.exists());
    assert!(root.exists());
    Ok(())
}

#[tokio::test]
async fn tree_depth_ceiling_reports_partial_failure() -> Result<()> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("deep");
    let mut cursor = root.clone();
    for name in ["b", "c", "d", "e"] {
        cursor = cursor.join(name);
    }
    fs::create_dir_all(&cursor)?;

    let remover = TreeRemover::new().with_max_depth(3);
    let outcome = remover.execute(&root, true).await;

    assert_eq!(
        outcome,
        RemovalOutcome::PartialFailure {
            kind: ErrorKind::DepthLimitExceeded,
            path: root.join("b").join("c").join("d"),
        }
    );
    assert!(root.exists());
    Ok(())
}

#[tokio::test]
async fn transform_involution_across_blocks() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("big.bin");
    let original: Vec<u8> = (0..200_000u32).map(|i| (i * 31 % 256) as u8).collect();
    fs::write(&path, &original)?;

    let transformer = StreamTransformer::new();
    let key = b"wrap-around-key";

    let bytes = transformer.transform_in_place(&path, key).await?;
    assert_eq!(bytes, original.len() as u64);
    let scrambled = fs::read(&path)?;
    assert_eq!(scrambled.len(), original.len());
    assert_ne!(scrambled, original);

    transformer.transform_in_place(&path, key).await?;
    assert_eq!(fs::read(&path)?, original);
    Ok(())
}

#[tokio::test]
async fn transform_rejects_empty_key() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("data.bin");
    fs::write(&path, b"unchanged")?;

    let transformer = StreamTransformer::new();
    let result = transformer.transform_in_place(&path, b"").await;
    assert!(matches!(result, Err(VaultError::EmptyKey)));
    assert_eq!(fs::read(&path)?, b"unchanged");
    Ok(())
}

#[tokio::test]
async fn search_matches_name_substring() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = tmp.path();
    fs::write(dir.join("notes.txt"), b"")?;
    fs::write(dir.join("readme.md"), b"")?;
    fs::create_dir(dir.join("notebooks"))?;

    let mut hits = file_ops::search(dir, "note").await?;
    hits.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        hits,
        vec![
            (dir.join("notebooks"), EntryKind::Directory),
            (dir.join("notes.txt"), EntryKind::File),
        ]
    );

    let none = file_ops::search(dir, "zzz").await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn search_is_not_recursive() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = tmp.path();
    fs::create_dir(dir.join("sub"))?;
    fs::write(dir.join("sub").join("nested-match.txt"), b"")?;

    let hits = file_ops::search(dir, "match").await?;
    assert!(hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn file_ops_lifecycle() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = tmp.path();

    let created = dir.join("new.txt");
    file_ops::create_file(&created).await?;
    assert_eq!(fs_ops::stat(&created).await?, EntryKind::File);

    // Creating again leaves the existing file untouched
    fs::write(&created, b"content")?;
    file_ops::create_file(&created).await?;
    assert_eq!(fs::read(&created)?, b"content");

    let copied = dir.join("copy.txt");
    let bytes = file_ops::copy_file(&created, &copied).await?;
    assert_eq!(bytes, 7);
    assert_eq!(fs::read(&copied)?, b"content");

    let renamed = dir.join("renamed.txt");
    file_ops::rename_entry(&copied, &renamed).await?;
    assert!(!copied.exists());
    assert_eq!(fs::read(&renamed)?, b"content");

    file_ops::delete_file(&renamed).await?;
    assert!(matches!(
        fs_ops::stat(&renamed).await,
        Err(VaultError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn directory_listing_reports_kinds() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = tmp.path();
    fs::write(dir.join("plain.txt"), b"x")?;
    fs::create_dir(dir.join("nested"))?;

    let mut entries = file_ops::list_dir(dir).await?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        entries,
        vec![
            ("nested".to_string(), EntryKind::Directory),
            ("plain.txt".to_string(), EntryKind::File),
        ]
    );

    // Listing a file is a structured failure, not a panic or raw errno
    let result = file_ops::list_dir(&dir.join("plain.txt")).await;
    assert!(matches!(result, Err(VaultError::NotADirectory(_))));
    Ok(())
}

#[tokio::test]
async fn entry_report_snapshot() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("observed.bin");
    fs::write(&path, vec![0u8; 1234])?;

    let report = file_ops::entry_report(&path).await?;
    assert_eq!(report.kind, EntryKind::File);
    assert_eq!(report.size, 1234);
    assert!(report.modified.is_some());

    let missing = file_ops::entry_report(&tmp.path().join("gone")).await;
    assert!(matches!(missing, Err(VaultError::NotFound(_))));
    Ok(())
}
