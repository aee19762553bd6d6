//! # VaultFS - Local File Vault Library
//!
//! VaultFS manages files and directories on a single machine and can
//! symmetrically encrypt/decrypt file contents in place, gated by a stored
//! password.
//!
//! ## Features
//!
//! - **Tree Remover**: safe recursive deletion with a two-phase
//!   check/confirm/execute protocol and an explicit-stack post-order walk
//! - **Stream Cipher Transform**: repeating-key XOR applied in place,
//!   length-preserving and involutive (the same call encrypts and decrypts)
//! - **Filesystem Access Layer**: structured outcomes instead of raw OS
//!   error codes
//! - **Password Gate**: stored-secret login handing out an explicit
//!   [`auth::Session`] token
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use vaultfs::{cipher::StreamTransformer, tree::{RemovalOutcome, TreeRemover}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Encrypt (and later decrypt, with the same call) a file in place
//!     let transformer = StreamTransformer::new();
//!     transformer.transform_in_place(Path::new("notes.txt"), b"secret key").await?;
//!
//!     // Remove a directory tree, asking before touching a non-empty one
//!     let remover = TreeRemover::new();
//!     match remover.check_removable(Path::new("./scratch")).await {
//!         RemovalOutcome::NotEmptyNeedsConfirmation => { /* prompt the user */ }
//!         _ => { remover.execute(Path::new("./scratch"), false).await; }
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cipher;
pub mod config;
pub mod error;
pub mod file_ops;
pub mod fs_ops;
pub mod metadata;
pub mod tree;

// Re-export common types for convenience
pub use error::VaultError;
