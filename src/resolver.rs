//! Placeholder resolution over configuration trees.
//!
//! [`Resolver`] walks a tree top-down in a single pass and builds a new tree
//! in which every placeholder in a placeholder position has been replaced by
//! its runtime value. The input is never mutated.
//!
//! # Placeholder positions
//!
//! Detection is positional. A bare two-element `(system, "NAME")` tuple is a
//! placeholder at the root, as a mapping key or value, as a record field, and
//! as the value slot of a keyword entry. As a direct element of a sequence a
//! two-element tuple is read as a keyword entry `(key, value)` instead: the
//! key is kept verbatim and only the value slot is resolved. Three-element
//! placeholders (explicit options or literal escapes) resolve everywhere.
//!
//! ```
//! use bootconf::env::MockEnv;
//! use bootconf::{Resolver, Value};
//!
//! let env = MockEnv::new().with_env("HOST", "localhost");
//! let resolver = Resolver::new();
//!
//! // Sequence element: plain data.
//! let list = Value::from(vec![Value::from("foo"), Value::env("HOST")]);
//! assert_eq!(resolver.resolve_with_env(&list, &env).unwrap(), list);
//!
//! // Keyword value slot: placeholder.
//! let keyword = Value::keyword([("host", Value::env("HOST"))]);
//! assert_eq!(
//!     resolver.resolve_with_env(&keyword, &env).unwrap(),
//!     Value::keyword([("host", "localhost")])
//! );
//! ```

use std::collections::BTreeSet;

use crate::cast::cast;
use crate::env::{ConfigEnv, RealEnv};
use crate::error::ResolveError;
use crate::placeholder::{Placeholder, ResolveOptions};
use crate::transform::TransformRegistry;
use crate::value::{Mapping, Record, Value};

/// Record tags that are always opaque: compiled patterns.
pub const BUILTIN_OPAQUE_TYPES: &[&str] = &["Regex"];

/// Record type-tags the resolver never traverses.
///
/// Always contains [`BUILTIN_OPAQUE_TYPES`]; callers may add more.
/// Membership is by tag, never by the shape of the fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueTypes {
    tags: BTreeSet<String>,
}

impl Default for OpaqueTypes {
    fn default() -> Self {
        Self {
            tags: BUILTIN_OPAQUE_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl OpaqueTypes {
    /// The built-in opaque set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add caller-supplied tags to the set.
    pub fn extend<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Check if records tagged `tag` are opaque.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Iterate over the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// Resolves placeholders in configuration trees.
///
/// A resolver holds no state between passes; the same resolver can be used
/// for any number of trees.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    transforms: TransformRegistry,
    opaque: OpaqueTypes,
}

impl Resolver {
    /// Resolver with no transforms and the built-in opaque types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `transforms` for placeholders that name a transform.
    pub fn transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    /// Treat records with these tags as opaque, in addition to the built-ins.
    pub fn opaque_types<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opaque = self.opaque.extend(tags);
        self
    }

    /// The opaque type set in effect.
    pub fn opaque(&self) -> &OpaqueTypes {
        &self.opaque
    }

    /// Resolve `value` against the real process environment.
    pub fn resolve(&self, value: &Value) -> Result<Value, ResolveError> {
        self.resolve_with_env(value, &RealEnv::new())
    }

    /// Resolve `value` against a custom environment.
    pub fn resolve_with_env(&self, value: &Value, env: &dyn ConfigEnv) -> Result<Value, ResolveError> {
        self.walk(value, env)
    }

    /// Resolve every key and value of a mapping.
    pub fn resolve_mapping(&self, mapping: &Mapping, env: &dyn ConfigEnv) -> Result<Mapping, ResolveError> {
        let mut resolved = Mapping::with_capacity(mapping.len());
        for (key, value) in mapping.iter() {
            resolved.insert(self.walk(key, env)?, self.walk(value, env)?);
        }
        Ok(resolved)
    }

    /// Resolve a single environment lookup.
    ///
    /// A value read from the environment is cast and then transformed. When
    /// the variable is unset, the default (or nil) is returned as-is, unless
    /// the lookup is required.
    pub fn resolve_lookup(
        &self,
        name: &str,
        options: &ResolveOptions,
        env: &dyn ConfigEnv,
    ) -> Result<Value, ResolveError> {
        match env.get_env(name) {
            Some(raw) => {
                tracing::debug!(variable = name, cast = %options.kind, "environment variable found");
                let value = cast(&raw, options.kind).map_err(|err| ResolveError::CastFailure {
                    name: name.to_string(),
                    kind: err.kind,
                    raw: err.raw,
                })?;
                self.transforms.invoke(value, options.transform.as_ref())
            }
            None if options.required => Err(ResolveError::RequiredMissing {
                name: name.to_string(),
            }),
            None => {
                tracing::debug!(
                    variable = name,
                    has_default = options.default.is_some(),
                    "environment variable not set"
                );
                Ok(options.default.clone().unwrap_or_default())
            }
        }
    }

    fn walk(&self, value: &Value, env: &dyn ConfigEnv) -> Result<Value, ResolveError> {
        match value {
            Value::Tuple(elements) => match Placeholder::parse(elements)? {
                Some(Placeholder::Literal(inner)) => Ok(inner.clone()),
                Some(Placeholder::EnvLookup { name, options }) => {
                    self.resolve_lookup(name, &options, env)
                }
                None => Ok(value.clone()),
            },
            Value::Record(record) if self.opaque.contains(record.tag()) => {
                tracing::debug!(tag = record.tag(), "passing opaque record through");
                Ok(value.clone())
            }
            Value::Record(record) => {
                let mut resolved = Record::new(record.tag());
                for (name, field) in record.fields() {
                    resolved.set(name, self.walk(field, env)?);
                }
                Ok(Value::Record(resolved))
            }
            Value::Mapping(mapping) => self.resolve_mapping(mapping, env).map(Value::Mapping),
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.walk_element(item, env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Range { .. }
            | Value::Nil
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::Atom(_) => Ok(value.clone()),
        }
    }

    fn walk_element(&self, item: &Value, env: &dyn ConfigEnv) -> Result<Value, ResolveError> {
        match item {
            Value::Tuple(pair) if pair.len() == 2 => Ok(Value::Tuple(vec![
                pair[0].clone(),
                self.walk(&pair[1], env)?,
            ])),
            other => self.walk(other, env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;
    use crate::placeholder::CastType;

    fn env() -> MockEnv {
        MockEnv::new()
            .with_env("HOST", "localhost")
            .with_env("PORT", "4321")
            .with_env("RATIO", "0.75")
            .with_env("LEVEL", "debug")
            .with_env("DEBUG", "true")
            .with_env("BAD_PORT", "http")
    }

    fn resolve(value: &Value) -> Result<Value, ResolveError> {
        Resolver::new().resolve_with_env(value, &env())
    }

    #[test]
    fn test_lookup_present_casts_value() {
        let resolver = Resolver::new();
        let env = env();

        let port = ResolveOptions::new().kind(CastType::Integer).required();
        assert_eq!(resolver.resolve_lookup("PORT", &port, &env), Ok(Value::Integer(4321)));

        let ratio = ResolveOptions::new().kind(CastType::Float);
        assert_eq!(resolver.resolve_lookup("RATIO", &ratio, &env), Ok(Value::Float(0.75)));

        let level = ResolveOptions::new().kind(CastType::Atom);
        assert_eq!(resolver.resolve_lookup("LEVEL", &level, &env), Ok(Value::atom("debug")));

        let debug = ResolveOptions::new().kind(CastType::Boolean);
        assert_eq!(resolver.resolve_lookup("DEBUG", &debug, &env), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_lookup_absent_uses_default_or_nil() {
        let resolver = Resolver::new();
        let env = env();

        let options = ResolveOptions::new().default_value("fallback");
        assert_eq!(
            resolver.resolve_lookup("UNSET", &options, &env),
            Ok(Value::from("fallback"))
        );
        assert_eq!(
            resolver.resolve_lookup("UNSET", &ResolveOptions::new(), &env),
            Ok(Value::Nil)
        );
    }

    #[test]
    fn test_default_is_not_cast_or_transformed() {
        let resolver = Resolver::new().transforms(
            TransformRegistry::new().register("Fail", "always", |_| Err("called".to_string())),
        );
        let options = ResolveOptions::new()
            .kind(CastType::Integer)
            .default_value("not-a-number")
            .transform("Fail", "always");

        assert_eq!(
            resolver.resolve_lookup("UNSET", &options, &env()),
            Ok(Value::from("not-a-number"))
        );
    }

    #[test]
    fn test_required_missing() {
        let options = ResolveOptions::new().kind(CastType::Integer).required();
        let err = Resolver::new()
            .resolve_lookup("UNSET_PORT", &options, &env())
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::RequiredMissing {
                name: "UNSET_PORT".to_string()
            }
        );
    }

    #[test]
    fn test_required_ignores_default() {
        let options = ResolveOptions::new().default_value(1).required();
        assert!(Resolver::new()
            .resolve_lookup("UNSET", &options, &env())
            .is_err());
    }

    #[test]
    fn test_cast_failure_carries_name_and_raw() {
        let options = ResolveOptions::new().kind(CastType::Integer);
        let err = Resolver::new()
            .resolve_lookup("BAD_PORT", &options, &env())
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::CastFailure {
                name: "BAD_PORT".to_string(),
                kind: CastType::Integer,
                raw: "http".to_string(),
            }
        );
    }

    #[test]
    fn test_transform_applied_after_cast() {
        let resolver = Resolver::new().transforms(TransformRegistry::new().register(
            "Ports",
            "double",
            |value| match value {
                Value::Integer(port) => Ok(Value::Integer(port * 2)),
                other => Err(format!("expected integer, got {}", other.type_name())),
            },
        ));
        let options = ResolveOptions::new()
            .kind(CastType::Integer)
            .transform("Ports", "double");

        assert_eq!(
            resolver.resolve_lookup("PORT", &options, &env()),
            Ok(Value::Integer(8642))
        );
    }

    #[test]
    fn test_mapping_value_position_resolves() {
        let config = Value::Mapping(Mapping::new().with(Value::atom("host"), Value::env("HOST")));
        assert_eq!(
            resolve(&config),
            Ok(Value::Mapping(Mapping::new().with(Value::atom("host"), "localhost")))
        );
    }

    #[test]
    fn test_mapping_keys_resolve() {
        let config = Value::Mapping(Mapping::new().with(Value::env("LEVEL"), 1));
        assert_eq!(
            resolve(&config),
            Ok(Value::Mapping(Mapping::new().with("debug", 1)))
        );
    }

    #[test]
    fn test_bare_pair_in_sequence_is_plain_data() {
        let list = Value::Sequence(vec![Value::from("foo"), Value::Integer(123), Value::env("HOST")]);
        assert_eq!(resolve(&list), Ok(list.clone()));
    }

    #[test]
    fn test_three_element_form_in_sequence_resolves() {
        let list = Value::Sequence(vec![
            Value::from("foo"),
            Value::Integer(123),
            Value::env_with("HOST", ResolveOptions::new().kind(CastType::String)),
        ]);
        assert_eq!(
            resolve(&list),
            Ok(Value::Sequence(vec![
                Value::from("foo"),
                Value::Integer(123),
                Value::from("localhost"),
            ]))
        );
    }

    #[test]
    fn test_keyword_value_slot_resolves() {
        let config = Value::keyword([
            ("host", Value::env("HOST")),
            (
                "port",
                Value::env_with("PORT", ResolveOptions::new().kind(CastType::Integer)),
            ),
        ]);
        assert_eq!(
            resolve(&config),
            Ok(Value::keyword([
                ("host", Value::from("localhost")),
                ("port", Value::Integer(4321)),
            ]))
        );
    }

    #[test]
    fn test_records_resolve_field_values() {
        let record = Value::Record(
            Record::new("Endpoint")
                .field("host", Value::env("HOST"))
                .field("scheme", "https"),
        );
        assert_eq!(
            resolve(&record),
            Ok(Value::Record(
                Record::new("Endpoint")
                    .field("host", "localhost")
                    .field("scheme", "https")
            ))
        );
    }

    #[test]
    fn test_opaque_records_pass_through() {
        let regex = Value::Record(Record::new("Regex").field("source", Value::env("HOST")));
        assert_eq!(resolve(&regex), Ok(regex.clone()));

        let custom = Value::Record(Record::new("Secret").field("value", Value::env("HOST")));
        let resolver = Resolver::new().opaque_types(["Secret"]);
        assert_eq!(resolver.resolve_with_env(&custom, &env()), Ok(custom.clone()));
        assert_ne!(resolve(&custom), Ok(custom));
    }

    #[test]
    fn test_ranges_are_opaque() {
        let config = Value::Mapping(Mapping::new().with("ports", Value::range(4000, 4010)));
        assert_eq!(resolve(&config), Ok(config.clone()));
    }

    #[test]
    fn test_literal_escape_is_not_recursed() {
        let nested = Value::Mapping(Mapping::new().with("host", Value::env("HOST")));
        let config = Value::Mapping(Mapping::new().with("raw", Value::literal(nested.clone())));
        assert_eq!(
            resolve(&config),
            Ok(Value::Mapping(Mapping::new().with("raw", nested)))
        );

        let escaped_pair = Value::literal(Value::env("HOST"));
        assert_eq!(resolve(&escaped_pair), Ok(Value::env("HOST")));
    }

    #[test]
    fn test_non_placeholder_tuples_are_untouched() {
        let tuple = Value::tuple([Value::atom("ok"), Value::env("HOST"), Value::Integer(1)]);
        let config = Value::Mapping(Mapping::new().with("result", tuple.clone()));
        assert_eq!(resolve(&config), Ok(config.clone()));
    }

    #[test]
    fn test_failure_aborts_whole_tree() {
        let config = Value::Mapping(
            Mapping::new()
                .with("host", Value::env("HOST"))
                .with(
                    "secret",
                    Value::env_with("SECRET", ResolveOptions::new().required()),
                ),
        );
        assert_eq!(
            resolve(&config),
            Err(ResolveError::RequiredMissing {
                name: "SECRET".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_options_fail_resolution() {
        let config = Value::Tuple(vec![
            Value::atom("system"),
            Value::from("PORT"),
            Value::keyword([("type", Value::atom("decimal"))]),
        ]);
        assert!(matches!(
            resolve(&config),
            Err(ResolveError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_opaque_types_extend_keeps_builtins() {
        let opaque = OpaqueTypes::new().extend(["Secret", "Pid"]);
        assert!(opaque.contains("Regex"));
        assert!(opaque.contains("Secret"));
        assert!(!opaque.contains("Endpoint"));
        assert_eq!(opaque.iter().collect::<Vec<_>>(), vec!["Pid", "Regex", "Secret"]);
    }
}
