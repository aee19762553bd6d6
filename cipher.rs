//! In-place repeating-key stream transform.
//!
//! [`StreamTransformer`] rewrites a file's bytes where they sit: each byte
//! is XORed with the key byte at the cursor, and the cursor wraps modulo the
//! key length. The operation is an involution, so the same call both
//! encrypts and decrypts, and the file's length never changes.
//!
//! ## Block staging
//!
//! Rather than seeking backward after every byte, the file is processed in
//! blocks: read a block, transform it, write it back at its original
//! offset. 64KB balances memory usage against syscall overhead.

use crate::error::VaultError;
use crate::fs_ops;
use std::path::Path;
use tracing::{debug, info};

/// Staging block size for the in-place rewrite (64KB)
const BLOCK_SIZE: usize = 64 * 1024;

pub struct StreamTransformer {
    block_size: usize,
}

impl Default for StreamTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamTransformer {
    pub fn new() -> Self {
        Self {
            block_size: BLOCK_SIZE,
        }
    }

    /// Override the staging block size. The transform's result is identical
    /// for any non-zero size; only the I/O granularity changes.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        debug_assert!(block_size > 0);
        self.block_size = block_size;
        self
    }

    /// Transform `path`'s contents in place with a repeating-key XOR.
    ///
    /// Processes the file strictly sequentially from offset 0; the key
    /// cursor restarts at 0 on every call. Applying the transform twice with
    /// the same key restores the original contents bit-for-bit. Returns the
    /// number of bytes transformed.
    ///
    /// An I/O failure mid-transform aborts immediately; blocks already
    /// rewritten stay transformed. Callers needing atomicity must transform
    /// a copy and swap it in.
    pub async fn transform_in_place(&self, path: &Path, key: &[u8]) -> Result<u64, VaultError> {
        if key.is_empty() {
            return Err(VaultError::EmptyKey);
        }

        debug!(path = %path.display(), block_size = self.block_size, "starting in-place transform");
        let mut handle = fs_ops::open_rewrite(path).await?;

        let mut buf = vec![0u8; self.block_size];
        let mut offset = 0u64;
        let mut cursor = 0usize;

        loop {
            let n = handle.read_at(offset, &mut buf).await?;
            if n == 0 {
                break;
            }

            for byte in &mut buf[..n] {
                *byte ^= key[cursor];
                cursor += 1;
                if cursor == key.len() {
                    cursor = 0;
                }
            }

            handle.write_at(offset, &buf[..n]).await?;
            offset += n as u64;
        }

        handle.flush().await?;
        info!(path = %path.display(), bytes = offset, "transform complete");
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    async fn transform_file(data: &[u8], key: &[u8], block_size: usize) -> Vec<u8> {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("subject.bin");
        fs::write(&path, data).expect("write subject");

        let transformer = StreamTransformer::new().with_block_size(block_size);
        transformer
            .transform_in_place(&path, key)
            .await
            .expect("transform failed");

        fs::read(&path).expect("read back")
    }

    #[tokio::test]
    async fn test_involution() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("subject.bin");
        let original: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        fs::write(&path, &original).expect("write subject");

        let transformer = StreamTransformer::new();
        let key = b"correct horse battery staple";

        transformer
            .transform_in_place(&path, key)
            .await
            .expect("first pass");
        let scrambled = fs::read(&path).expect("read scrambled");
        assert_ne!(scrambled, original);
        assert_eq!(scrambled.len(), original.len());

        transformer
            .transform_in_place(&path, key)
            .await
            .expect("second pass");
        let restored = fs::read(&path).expect("read restored");
        assert_eq!(restored, original);
    }

    #[tokio::test]
    async fn test_key_cursor_wraps_across_blocks() {
        // Key length deliberately coprime with the block size, so the
        // cursor crosses block boundaries mid-key.
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let key = b"seven77";

        let out = transform_file(&data, key, 4096).await;

        let expected: Vec<u8> = data
            .iter()
            .enumerate()
            .map(|(i, b)| b ^ key[i % key.len()])
            .collect();
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_block_size_does_not_change_result() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(100);
        let key = b"k3y";

        let small = transform_file(&data, key, 7).await;
        let large = transform_file(&data, key, 64 * 1024).await;
        assert_eq!(small, large);
    }

    #[tokio::test]
    async fn test_empty_key_rejected_file_untouched() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("subject.bin");
        let original = b"must remain untouched".to_vec();
        fs::write(&path, &original).expect("write subject");

        let transformer = StreamTransformer::new();
        let result = transformer.transform_in_place(&path, b"").await;

        assert!(matches!(result, Err(VaultError::EmptyKey)));
        assert_eq!(fs::read(&path).expect("read back"), original);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let out = transform_file(b"", b"key", 4096).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("nope.bin");

        let transformer = StreamTransformer::new();
        let result = transformer.transform_in_place(&path, b"key").await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }
}
