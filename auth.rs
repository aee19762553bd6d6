//! Password gate for the command shell.
//!
//! This module provides [`PasswordStore`] for setting and checking the
//! vault password. It is a stored-secret string compare, not a credential
//! system: the password lives in a single file and a successful [`login`]
//! hands back an explicit [`Session`] token that the dispatcher threads
//! through to authenticated commands.
//!
//! ## Security Notes
//!
//! - The password file is written with Unix permissions 0600
//! - Loaded secret buffers are zeroized after the compare
//!
//! [`login`]: PasswordStore::login

use crate::config::Config;
use crate::error::VaultError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Proof of a successful login.
///
/// Constructed only by [`PasswordStore::login`]; commands that mutate the
/// filesystem take one by value or reference, so tests can exercise
/// authorized and unauthorized paths without global state.
#[derive(Debug, Clone, Copy)]
pub struct Session(());

/// Reads and writes the stored vault password.
pub struct PasswordStore {
    path: PathBuf,
}

impl PasswordStore {
    pub fn new(cfg: &Config) -> Self {
        Self {
            path: PathBuf::from(&cfg.password_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a password has been set at all.
    pub async fn is_set(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Store `password`, replacing any previous one.
    pub async fn set_password(&self, password: &str) -> Result<(), VaultError> {
        info!(path = %self.path.display(), "storing vault password");

        // Write with restrictive permissions on Unix
        #[cfg(unix)]
        {
            let path = self.path.clone();
            let secret = Zeroizing::new(password.as_bytes().to_vec());
            tokio::task::spawn_blocking(move || {
                use std::fs::OpenOptions;
                use std::io::Write;
                use std::os::unix::fs::OpenOptionsExt;

                let mut f = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o600)
                    .open(&path)
                    .map_err(|e| VaultError::from_io(&path, e))?;
                f.write_all(&secret)
                    .map_err(|e| VaultError::from_io(&path, e))?;
                Ok::<(), VaultError>(())
            })
            .await
            .map_err(|e| VaultError::Io {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })??;
        }
        #[cfg(not(unix))]
        {
            fs::write(&self.path, password.as_bytes())
                .await
                .map_err(|e| VaultError::from_io(&self.path, e))?;
        }

        Ok(())
    }

    /// Compare `password` against the stored secret.
    ///
    /// A trailing newline in the stored file is ignored, so a hand-edited
    /// password file still matches.
    pub async fn login(&self, password: &str) -> Result<Session, VaultError> {
        let stored = match fs::read(&self.path).await {
            Ok(data) => Zeroizing::new(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "login attempted with no password set");
                return Err(VaultError::NoPasswordSet);
            }
            Err(e) => return Err(VaultError::from_io(&self.path, e)),
        };

        let trimmed = match stored.as_slice() {
            [head @ .., b'\n'] => head,
            all => all,
        };

        if trimmed == password.as_bytes() {
            info!("login successful");
            Ok(Session(()))
        } else {
            warn!("login failed: password mismatch");
            Err(VaultError::BadPassword)
        }
    }
}
