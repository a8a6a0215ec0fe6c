//! Secret resolution
//!
//! Secrets are looked up in an optional secrets file first (dotenv syntax,
//! `KEY="value"` per line) and then in the process environment. Loading the
//! file never mutates the environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading a secrets file
#[derive(Debug, Error)]
pub enum SecretsError {
    /// The file exists but could not be parsed
    #[error("Failed to parse secrets file '{path}': {detail}")]
    Parse { path: PathBuf, detail: String },
}

/// Key/value secrets loaded from a file, with environment fallback
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    source: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl SecretStore {
    /// An empty store; every lookup goes to the environment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load secrets from `path`
    ///
    /// A missing file yields an empty store rather than an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SecretsError> {
        let path = path.as_ref();
        let iter = match dotenvy::from_filename_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => {
                debug!("No secrets file at {}", path.display());
                return Ok(Self::empty());
            }
            Err(e) => {
                return Err(SecretsError::Parse {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                });
            }
        };

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| SecretsError::Parse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
            values.insert(key, value);
        }

        debug!("Loaded {} secret(s) from {}", values.len(), path.display());
        Ok(Self {
            source: Some(path.to_path_buf()),
            values,
        })
    }

    /// Build a store from in-memory pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source: None,
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// File the store was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Value stored in the file only, ignoring the environment
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Resolve `key` from the store, then from the environment
    ///
    /// Blank values count as absent.
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::to_string)
            .or_else(|| std::env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }
}
