//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services. Request handlers never read process-wide environment variables,
//! which keeps behaviour consistent across multi-threaded runtimes and test
//! harnesses.

use crate::error::{RegistryError, RegistryResult};
use std::path::{Path, PathBuf};

/// Default store filename when no explicit path is configured.
pub const DEFAULT_STORE_FILE: &str = "patients.json";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_path: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidField` if `store_path` is empty.
    pub fn new(store_path: PathBuf) -> RegistryResult<Self> {
        if store_path.as_os_str().is_empty() {
            return Err(RegistryError::InvalidField {
                field: "store_path",
                constraint: "cannot be empty".into(),
            });
        }

        Ok(Self { store_path })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

/// Resolve the store path from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default store file
/// relative to the current working directory.
pub fn store_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE))
}
