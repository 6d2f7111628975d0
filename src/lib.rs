//! Bootconf: startup-time resolution of deferred configuration placeholders.
//!
//! Configuration trees may contain placeholders that are only known when the
//! process starts. Bootconf walks a tree once, replaces each placeholder with
//! a value read from the environment (cast, transformed or defaulted as the
//! placeholder asks), and merges the result back over the original tree.
//!
//! # Quick Start
//!
//! ```
//! use bootconf::env::MockEnv;
//! use bootconf::prelude::*;
//!
//! let config = Value::Mapping(
//!     Mapping::new()
//!         .with(Value::atom("host"), Value::env("HOST"))
//!         .with(
//!             Value::atom("port"),
//!             Value::env_with("PORT", ResolveOptions::new().kind(CastType::Integer).required()),
//!         )
//!         .with(Value::atom("pattern"), Value::literal(Value::env("NOT_RESOLVED"))),
//! );
//!
//! let env = MockEnv::new()
//!     .with_env("HOST", "localhost")
//!     .with_env("PORT", "4321");
//!
//! let resolved = Resolver::new().resolve_with_env(&config, &env).unwrap();
//! assert_eq!(resolved.get_path("host"), Some(&Value::from("localhost")));
//! assert_eq!(resolved.get_path("port"), Some(&Value::Integer(4321)));
//! assert_eq!(resolved.get_path("pattern"), Some(&Value::env("NOT_RESOLVED")));
//! ```
//!
//! # Placeholder Grammar
//!
//! | Form | Meaning |
//! |------|---------|
//! | `(system, "NAME")` | environment lookup with default options |
//! | `(system, "NAME", OPTIONS)` | lookup with `type`, `default`, `required`, `transform` |
//! | `(system, literal, VALUE)` | `VALUE`, verbatim |
//!
//! See [`placeholder`] for the options and [`resolver`] for where in a tree
//! placeholders are recognized.
//!
//! # Architecture
//!
//! - **Pure core**: [`Resolver`] and [`deep_merge`] are pure functions of
//!   their inputs and an environment reader.
//! - **Imperative shell**: [`Bootstrap`] reads scopes from a [`ConfigStore`],
//!   resolves them and persists the results. I/O goes through [`ConfigEnv`],
//!   so tests inject a [`MockEnv`].
//!
//! # Module Structure
//!
//! - [`prelude`]: Convenient re-exports for common usage
//! - [`value`]: `Value` tree and its containers
//! - [`placeholder`]: Placeholder grammar and `ResolveOptions`
//! - [`cast`]: Raw string casts
//! - [`transform`]: Registered transforms
//! - [`resolver`]: Tree walking and environment lookups
//! - [`merge`]: Deep merge
//! - [`error`]: Error types
//! - [`mod@env`]: `ConfigEnv` trait and `MockEnv` for testing
//! - [`bootstrap`]: Boot-time harness and configuration store

pub mod bootstrap;
pub mod cast;
pub mod env;
pub mod error;
pub mod merge;
pub mod placeholder;
pub mod prelude;
pub mod resolver;
pub mod transform;
pub mod value;

pub use bootstrap::{
    transform_inline, BootMode, BootReport, Bootstrap, BootstrapConfig, ConfigStore, MemoryStore,
};
pub use env::{ConfigEnv, MockEnv, RealEnv};
pub use error::{BootError, BootErrors, ResolveError};
pub use merge::{deep_merge, deep_merge_value};
pub use placeholder::{CastType, Placeholder, ResolveOptions, TransformRef};
pub use resolver::{OpaqueTypes, Resolver};
pub use transform::TransformRegistry;
pub use value::{Atom, Mapping, Record, Value};
