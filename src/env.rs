//! ConfigEnv trait for testable I/O.
//!
//! The resolver's only external read dependency is an environment lookup.
//! The harness additionally reads its own bootstrap file. Both go through
//! `ConfigEnv` so tests never touch the real process environment.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Environment trait for resolution I/O.
///
/// # Example
///
/// ```
/// use bootconf::env::{ConfigEnv, MockEnv};
/// use bootconf::{Resolver, Value};
///
/// let env = MockEnv::new().with_env("HOST", "localhost");
/// let resolved = Resolver::new()
///     .resolve_with_env(&Value::env("HOST"), &env)
///     .unwrap();
/// assert_eq!(resolved, Value::from("localhost"));
/// ```
pub trait ConfigEnv: Send + Sync {
    /// Get an environment variable by name.
    ///
    /// Returns `None` if the variable is not set.
    fn get_env(&self, name: &str) -> Option<String>;

    /// Read a file's contents as a UTF-8 string.
    fn read_file(&self, path: &Path) -> io::Result<String>;
}

/// Production environment using standard library I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnv;

impl RealEnv {
    /// Create a new real environment.
    pub fn new() -> Self {
        Self
    }
}

impl ConfigEnv for RealEnv {
    fn get_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Mock environment for testing resolution.
///
/// # Example
///
/// ```
/// use bootconf::env::MockEnv;
///
/// let env = MockEnv::new()
///     .with_env("DATABASE_URL", "postgres://localhost/app")
///     .with_env("PORT", "4000")
///     .with_file("boot.toml", "mode = \"skip\"");
/// ```
#[derive(Debug, Default)]
pub struct MockEnv {
    files: RwLock<HashMap<PathBuf, String>>,
    env_vars: RwLock<HashMap<String, String>>,
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable.
    pub fn with_env(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_env(name, value);
        self
    }

    /// Set multiple environment variables from an iterator.
    pub fn with_envs<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.set_env(k, v);
        }
        self
    }

    /// Add a file with content.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), content.into());
        self
    }

    /// Update an environment variable.
    pub fn set_env(&self, name: impl Into<String>, value: impl Into<String>) {
        self.env_vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    /// Remove an environment variable.
    pub fn remove_env(&self, name: &str) {
        self.env_vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

impl ConfigEnv for MockEnv {
    fn get_env(&self, name: &str) -> Option<String> {
        self.env_vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("mock file not found: {}", path.display()),
                )
            })
    }
}
