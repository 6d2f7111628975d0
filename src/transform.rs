//! Registered post-processing transforms.
//!
//! A placeholder names its transform as `(namespace, function)`. The name is
//! resolved against a `TransformRegistry` handed to the resolver up front, so
//! every callable a configuration tree can reach is known before resolution
//! starts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::placeholder::TransformRef;
use crate::value::Value;

/// A single-argument transform. An `Err` carries the failure cause.
pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Transforms available to placeholders, keyed by reference.
///
/// # Example
///
/// ```
/// use bootconf::{TransformRegistry, Value};
///
/// let transforms = TransformRegistry::new().register("Text", "upcase", |value| {
///     match value {
///         Value::String(s) => Ok(Value::String(s.to_uppercase())),
///         other => Err(format!("expected a string, got {}", other.type_name())),
///     }
/// });
/// assert_eq!(transforms.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct TransformRegistry {
    handlers: HashMap<TransformRef, TransformFn>,
}

impl TransformRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform under `namespace.function`.
    ///
    /// Registering the same reference twice replaces the earlier transform.
    pub fn register<F>(
        mut self,
        namespace: impl Into<String>,
        function: impl Into<String>,
        transform: F,
    ) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.handlers
            .insert(TransformRef::new(namespace, function), Arc::new(transform));
        self
    }

    /// Check if `reference` is registered.
    pub fn contains(&self, reference: &TransformRef) -> bool {
        self.handlers.contains_key(reference)
    }

    /// Number of registered transforms.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Apply the transform named by `reference` to `value`.
    ///
    /// With no reference the value is returned unchanged.
    pub fn invoke(
        &self,
        value: Value,
        reference: Option<&TransformRef>,
    ) -> Result<Value, ResolveError> {
        let Some(reference) = reference else {
            return Ok(value);
        };
        let handler =
            self.handlers
                .get(reference)
                .ok_or_else(|| ResolveError::TransformFailure {
                    transform: reference.clone(),
                    cause: "transform is not registered".to_string(),
                })?;

        tracing::debug!(transform = %reference, "applying transform");
        handler(value).map_err(|cause| ResolveError::TransformFailure {
            transform: reference.clone(),
            cause,
        })
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        names.sort();
        f.debug_struct("TransformRegistry")
            .field("transforms", &names)
            .finish()
    }
}
