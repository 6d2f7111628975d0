//! Error types for placeholder resolution and boot-time harness failures.
//!
//! `ResolveError` is the single error a resolution pass can end with. The
//! harness wraps per-scope failures into `BootError` and accumulates them in
//! `BootErrors`, a `NonEmptyVec` that combines through stillwater's
//! `Semigroup`.

use std::fmt;

use stillwater::{NonEmptyVec, Semigroup};

use crate::placeholder::{CastType, TransformRef};

/// Failure of a single resolution pass.
///
/// Every variant is terminal: the pass produces no partial tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// A required variable is not set
    #[error("environment variable '{name}' required but is not set")]
    RequiredMissing { name: String },

    /// The raw value does not parse as the requested type
    #[error("environment variable '{name}' could not be cast to {kind}: \"{raw}\"")]
    CastFailure {
        name: String,
        kind: CastType,
        raw: String,
    },

    /// A transform failed or is not registered
    #[error("transform {transform} failed: {cause}")]
    TransformFailure {
        transform: TransformRef,
        cause: String,
    },

    /// A placeholder's options are malformed
    #[error("invalid options for environment variable '{name}': {reason}")]
    InvalidOptions { name: String, reason: String },
}

impl ResolveError {
    /// The environment variable this error relates to, if any.
    pub fn variable(&self) -> Option<&str> {
        match self {
            ResolveError::RequiredMissing { name }
            | ResolveError::CastFailure { name, .. }
            | ResolveError::InvalidOptions { name, .. } => Some(name),
            ResolveError::TransformFailure { .. } => None,
        }
    }
}

/// Failure reported by the boot harness.
#[derive(Debug, Clone, PartialEq)]
pub enum BootError {
    /// Resolving a scope's configuration failed
    Scope { scope: String, error: ResolveError },

    /// The bootstrap configuration itself could not be loaded
    Config { message: String },
}

impl BootError {
    /// The scope this error relates to, if any.
    pub fn scope(&self) -> Option<&str> {
        match self {
            BootError::Scope { scope, .. } => Some(scope),
            BootError::Config { .. } => None,
        }
    }

    /// The underlying resolution error, if any.
    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match self {
            BootError::Scope { error, .. } => Some(error),
            BootError::Config { .. } => None,
        }
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::Scope { scope, error } => write!(f, "[{}] {}", scope, error),
            BootError::Config { message } => write!(f, "bootstrap configuration: {}", message),
        }
    }
}

impl std::error::Error for BootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootError::Scope { error, .. } => Some(error),
            BootError::Config { .. } => None,
        }
    }
}

/// A non-empty collection of boot errors.
#[derive(Debug, Clone)]
pub struct BootErrors(pub NonEmptyVec<BootError>);

impl BootErrors {
    /// Create from a single error.
    pub fn single(error: BootError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(errors: Vec<BootError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Get the first error (always exists).
    pub fn first(&self) -> &BootError {
        self.0.head()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, kept for API consistency.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over errors.
    pub fn iter(&self) -> impl Iterator<Item = &BootError> {
        self.0.iter()
    }

    /// Names of the scopes that failed, in report order.
    pub fn failed_scopes(&self) -> Vec<&str> {
        self.iter().filter_map(BootError::scope).collect()
    }
}

impl Semigroup for BootErrors {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl From<BootError> for BootErrors {
    fn from(error: BootError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for BootErrors {
    type Item = BootError;
    type IntoIter = std::vec::IntoIter<BootError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl fmt::Display for BootErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Boot configuration errors ({}):", self.len())?;
        for error in self.iter() {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for BootErrors {}
