//! Convenient re-exports for common bootconf usage.
//!
//! ```
//! use bootconf::prelude::*;
//!
//! let config = Mapping::new()
//!     .with(Value::atom("port"), Value::env_with(
//!         "PORT",
//!         ResolveOptions::new().kind(CastType::Integer).default_value(4000),
//!     ));
//! let resolved = Resolver::new()
//!     .resolve_mapping(&config, &bootconf::env::MockEnv::new())
//!     .unwrap();
//! assert_eq!(resolved.get_named("port"), Some(&Value::Integer(4000)));
//! ```

pub use crate::bootstrap::{
    transform_inline, BootMode, BootReport, Bootstrap, BootstrapConfig, ConfigStore, MemoryStore,
};
pub use crate::env::{ConfigEnv, MockEnv, RealEnv};
pub use crate::error::{BootError, BootErrors, ResolveError};
pub use crate::merge::{deep_merge, deep_merge_value};
pub use crate::placeholder::{CastType, Placeholder, ResolveOptions, TransformRef};
pub use crate::resolver::{OpaqueTypes, Resolver};
pub use crate::transform::TransformRegistry;
pub use crate::value::{Atom, Mapping, Record, Value};

pub use stillwater::{NonEmptyVec, Semigroup};
