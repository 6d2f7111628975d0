//! Boot-time harness.
//!
//! The harness runs the resolver once per configuration scope at process
//! start and persists the results into a [`ConfigStore`]. It is the only part
//! of the crate that writes anywhere; the resolver and the merger are pure.
//!
//! # Example
//!
//! ```
//! use bootconf::env::MockEnv;
//! use bootconf::prelude::*;
//!
//! let store = MemoryStore::new().with_scope(
//!     "web",
//!     Mapping::new().with(Value::atom("host"), Value::env("HOST")),
//! );
//! let env = MockEnv::new().with_env("HOST", "example.com");
//!
//! let report = Bootstrap::new(BootstrapConfig::default())
//!     .init_with_env(&store, &env)
//!     .unwrap();
//! assert_eq!(report, BootReport::Resolved { scopes: vec!["web".to_string()] });
//! assert_eq!(
//!     store.get_all("web").get(&Value::atom("host")),
//!     Some(&Value::from("example.com"))
//! );
//! ```

#[cfg(feature = "toml")]
use std::path::Path;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::env::{ConfigEnv, RealEnv};
use crate::error::{BootError, BootErrors, ResolveError};
use crate::merge::deep_merge;
use crate::resolver::Resolver;
use crate::transform::TransformRegistry;
use crate::value::Mapping;

/// Environment variable overriding [`BootstrapConfig::mode`].
pub const MODE_ENV_VAR: &str = "BOOTCONF_MODE";

/// Whether boot-time resolution runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootMode {
    /// Resolve and persist every scope
    #[default]
    Resolve,
    /// Leave the store untouched, e.g. when the deployment already resolved it
    Skip,
}

impl FromStr for BootMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resolve" => Ok(BootMode::Resolve),
            "skip" => Ok(BootMode::Skip),
            other => Err(format!(
                "unknown boot mode '{}' (expected 'resolve' or 'skip')",
                other
            )),
        }
    }
}

/// Harness settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    pub mode: BootMode,
    /// Record tags to keep opaque, on top of the built-in ones
    pub opaque_types: Vec<String>,
    /// Keys dropped by [`Bootstrap::transform`] before resolution
    pub exclude_keys: Vec<String>,
}

impl BootstrapConfig {
    /// Parse settings from TOML.
    ///
    /// ```
    /// use bootconf::{BootMode, BootstrapConfig};
    ///
    /// let config = BootstrapConfig::from_toml_str(r#"
    ///     mode = "skip"
    ///     opaque_types = ["Secret"]
    /// "#).unwrap();
    /// assert_eq!(config.mode, BootMode::Skip);
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, BootErrors> {
        toml::from_str(content).map_err(|e| {
            BootErrors::single(BootError::Config {
                message: e.to_string(),
            })
        })
    }

    /// Read and parse a TOML settings file through `env`.
    #[cfg(feature = "toml")]
    pub fn load(env: &dyn ConfigEnv, path: &Path) -> Result<Self, BootErrors> {
        let content = env.read_file(path).map_err(|e| {
            BootErrors::single(BootError::Config {
                message: format!("{}: {}", path.display(), e),
            })
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from JSON.
    pub fn from_json_str(content: &str) -> Result<Self, BootErrors> {
        serde_json::from_str(content).map_err(|e| {
            BootErrors::single(BootError::Config {
                message: e.to_string(),
            })
        })
    }

    /// Apply overrides from the environment (currently [`MODE_ENV_VAR`]).
    pub fn with_env_overrides(mut self, env: &dyn ConfigEnv) -> Result<Self, BootErrors> {
        if let Some(raw) = env.get_env(MODE_ENV_VAR) {
            self.mode = raw.parse().map_err(|message| {
                BootErrors::single(BootError::Config {
                    message: format!("{}: {}", MODE_ENV_VAR, message),
                })
            })?;
        }
        Ok(self)
    }
}

/// The process-wide configuration store the harness persists into.
///
/// Implementations own their synchronization; the harness only calls
/// `put_all` after every scope has resolved.
pub trait ConfigStore: Send + Sync {
    /// Names of the scopes to resolve, in resolution order.
    fn scopes(&self) -> Vec<String>;

    /// Current configuration of `scope` (empty if unknown).
    fn get_all(&self, scope: &str) -> Mapping;

    /// Replace the configuration of `scope`.
    fn put_all(&self, scope: &str, config: Mapping);
}

/// In-memory store, in scope insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scopes: RwLock<Vec<(String, Mapping)>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scope with its configuration.
    pub fn with_scope(self, scope: impl Into<String>, config: Mapping) -> Self {
        self.put_all(&scope.into(), config);
        self
    }
}

impl ConfigStore for MemoryStore {
    fn scopes(&self) -> Vec<String> {
        self.scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn get_all(&self, scope: &str) -> Mapping {
        self.scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(name, _)| name == scope)
            .map(|(_, config)| config.clone())
            .unwrap_or_default()
    }

    fn put_all(&self, scope: &str, config: Mapping) {
        let mut scopes = self.scopes.write().unwrap_or_else(PoisonError::into_inner);
        match scopes.iter_mut().find(|(name, _)| name == scope) {
            Some((_, slot)) => *slot = config,
            None => scopes.push((scope.to_string(), config)),
        }
    }
}

/// Outcome of [`Bootstrap::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootReport {
    /// Resolution was disabled by [`BootMode::Skip`]
    Skipped,
    /// These scopes were resolved and persisted
    Resolved { scopes: Vec<String> },
}

/// Boot-time resolution driver.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    config: BootstrapConfig,
    transforms: TransformRegistry,
}

impl Bootstrap {
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            config,
            transforms: TransformRegistry::new(),
        }
    }

    /// Make these transforms available to placeholders.
    pub fn transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    /// The settings in effect.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// The resolver this harness runs.
    pub fn resolver(&self) -> Resolver {
        Resolver::new()
            .transforms(self.transforms.clone())
            .opaque_types(self.config.opaque_types.iter().cloned())
    }

    /// Resolve every scope of `store` against the real environment.
    pub fn init(&self, store: &dyn ConfigStore) -> Result<BootReport, BootErrors> {
        self.init_with_env(store, &RealEnv::new())
    }

    /// Resolve every scope of `store` against a custom environment.
    ///
    /// Each scope is resolved, merged over its current configuration and
    /// persisted. Nothing is persisted unless every scope resolves; all
    /// failing scopes are reported together.
    pub fn init_with_env(
        &self,
        store: &dyn ConfigStore,
        env: &dyn ConfigEnv,
    ) -> Result<BootReport, BootErrors> {
        if self.config.mode == BootMode::Skip {
            tracing::info!("boot-time configuration resolution skipped");
            return Ok(BootReport::Skipped);
        }

        let resolver = self.resolver();
        let mut resolved = Vec::new();
        let mut errors = Vec::new();

        for scope in store.scopes() {
            let current = store.get_all(&scope);
            match resolver.resolve_mapping(&current, env) {
                Ok(overlay) => resolved.push((scope, deep_merge(current, overlay))),
                Err(error) => {
                    tracing::warn!(scope = %scope, error = %error, "failed to resolve configuration scope");
                    errors.push(BootError::Scope { scope, error });
                }
            }
        }

        if let Some(errors) = BootErrors::from_vec(errors) {
            return Err(errors);
        }

        let mut scopes = Vec::with_capacity(resolved.len());
        for (scope, config) in resolved {
            store.put_all(&scope, config);
            tracing::info!(scope = %scope, "configuration scope resolved");
            scopes.push(scope);
        }
        Ok(BootReport::Resolved { scopes })
    }

    /// Resolve an inline configuration, dropping the configured
    /// [`BootstrapConfig::exclude_keys`] first.
    pub fn transform(&self, config: &Mapping, env: &dyn ConfigEnv) -> Result<Mapping, ResolveError> {
        let excluded: Vec<&str> = self.config.exclude_keys.iter().map(String::as_str).collect();
        transform_inline(config, &excluded, &self.resolver(), env)
    }
}

/// Resolve a configuration supplied inline rather than read from a store.
///
/// Entries whose key is an atom or string named in `exclude_keys` are
/// removed before resolution and do not appear in the result.
pub fn transform_inline(
    config: &Mapping,
    exclude_keys: &[&str],
    resolver: &Resolver,
    env: &dyn ConfigEnv,
) -> Result<Mapping, ResolveError> {
    let mut filtered = config.clone();
    filtered.retain(|key, _| !key.key_name().is_some_and(|name| exclude_keys.contains(&name)));
    resolver.resolve_mapping(&filtered, env)
}
