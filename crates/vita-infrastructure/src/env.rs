//! Environment variable sources.
//!
//! Provides the process environment, optionally backed by a `.env` file, and
//! an in-memory source for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vita_core::{Result, VitaError};

/// Default dotenv file, relative to the working directory.
pub const DOTENV_FILE: &str = ".env";

/// Read-only lookup of configuration variables.
pub trait EnvSource {
    /// Returns the value of `key`, or `None` if it is unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment with values from a `.env` file as fallback.
///
/// Real environment variables always win over the file. The file is parsed
/// once at construction and never written back into the process environment.
#[derive(Debug, Default)]
pub struct ProcessEnv {
    dotenv: HashMap<String, String>,
    dotenv_path: Option<PathBuf>,
}

impl ProcessEnv {
    /// Process environment only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process environment plus `./.env` when it exists.
    ///
    /// # Errors
    ///
    /// Returns `VitaError::Configuration` if the file exists but cannot be
    /// parsed.
    pub fn with_dotenv() -> Result<Self> {
        Self::with_dotenv_path(DOTENV_FILE)
    }

    /// Process environment plus the given dotenv file when it exists.
    pub fn with_dotenv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(err) if err.not_found() => {
                tracing::debug!(path = %path.display(), "no dotenv file");
                return Ok(Self::new());
            }
            Err(err) => return Err(dotenv_error(path, err)),
        };

        let mut dotenv = HashMap::new();
        for entry in iter {
            let (key, value) = entry.map_err(|err| dotenv_error(path, err))?;
            dotenv.insert(key, value);
        }

        tracing::debug!(path = %path.display(), entries = dotenv.len(), "loaded dotenv file");
        Ok(Self {
            dotenv,
            dotenv_path: Some(path.to_path_buf()),
        })
    }

    /// Path of the dotenv file that was loaded, if any.
    pub fn dotenv_path(&self) -> Option<&Path> {
        self.dotenv_path.as_deref()
    }
}

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.dotenv.get(key).cloned())
    }
}

fn dotenv_error(path: &Path, err: dotenvy::Error) -> VitaError {
    VitaError::configuration(format!("failed to read {}: {err}", path.display()))
}

/// In-memory variables, mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl EnvSource for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let env = ProcessEnv::with_dotenv_path(temp_dir.path().join(".env")).unwrap();
        assert!(env.dotenv_path().is_none());
    }

    #[test]
    fn test_dotenv_values_are_visible() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".env");
        fs::write(
            &file_path,
            "VITA_TEST_DOTENV_ONLY_7F3A=from-file\n# comment\nVITA_TEST_QUOTED_7F3A=\"a b\"\n",
        )
        .unwrap();

        let env = ProcessEnv::with_dotenv_path(&file_path).unwrap();

        assert_eq!(env.dotenv_path(), Some(file_path.as_path()));
        assert_eq!(env.get("VITA_TEST_DOTENV_ONLY_7F3A").as_deref(), Some("from-file"));
        assert_eq!(env.get("VITA_TEST_QUOTED_7F3A").as_deref(), Some("a b"));
        assert_eq!(env.get("VITA_TEST_UNSET_7F3A"), None);
    }

    #[test]
    fn test_process_env_wins_over_dotenv() {
        // PATH is set in every test environment.
        let Ok(path) = std::env::var("PATH") else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".env");
        fs::write(&file_path, "PATH=/from/dotenv\n").unwrap();

        let env = ProcessEnv::with_dotenv_path(&file_path).unwrap();
        assert_eq!(env.get("PATH"), Some(path));
    }

    #[test]
    fn test_malformed_dotenv_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".env");
        fs::write(&file_path, "NOT VALID LINE WITHOUT EQUALS\n").unwrap();

        let err = ProcessEnv::with_dotenv_path(&file_path).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_map_env() {
        let env = MapEnv::new().set("A", "1");
        assert_eq!(env.get("A").as_deref(), Some("1"));
        let collected: MapEnv = [("B", "2")].into_iter().collect();
        assert_eq!(collected.get("B").as_deref(), Some("2"));
    }
}
