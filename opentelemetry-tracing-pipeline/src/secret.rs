//! # Secret resolution
//!
//! Credentials may be given inline or as a path to a file holding them. The
//! file is read once while compiling, so an unreadable file is reported as a
//! configuration error.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// A credential as written in the configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Secret {
    /// The secret value itself.
    Literal(String),
    /// A file whose entire contents are the secret.
    File(PathBuf),
}

/// Turns a [`Secret`] into the bytes it stands for.
pub trait SecretResolver {
    /// Resolves the secret, reading from disk if needed.
    fn resolve(&self, secret: &Secret) -> ConfigResult<Vec<u8>>;
}

/// Resolves file secrets by reading them from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSecretResolver;

impl FileSecretResolver {
    pub fn new() -> Self {
        FileSecretResolver
    }

    fn read(path: &Path) -> ConfigResult<Vec<u8>> {
        std::fs::read(path).map_err(|source| ConfigError::SecretUnreadable {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SecretResolver for FileSecretResolver {
    fn resolve(&self, secret: &Secret) -> ConfigResult<Vec<u8>> {
        match secret {
            Secret::Literal(value) => Ok(value.clone().into_bytes()),
            Secret::File(path) => Self::read(path),
        }
    }
}

impl<R: SecretResolver + ?Sized> SecretResolver for &R {
    fn resolve(&self, secret: &Secret) -> ConfigResult<Vec<u8>> {
        (**self).resolve(secret)
    }
}
