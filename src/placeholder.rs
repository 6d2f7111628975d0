//! Placeholder grammar.
//!
//! Placeholders are tuples tagged with the reserved atom `system`:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `(system, "NAME")` | read `NAME` from the environment with default options |
//! | `(system, "NAME", OPTIONS)` | read `NAME` with explicit [`ResolveOptions`] |
//! | `(system, literal, VALUE)` | literal escape, resolves to `VALUE` verbatim |
//!
//! `OPTIONS` is a mapping or a keyword sequence with the keys `type`,
//! `default`, `required` and `transform`, all optional.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::value::Value;

/// Reserved first element of every placeholder tuple.
pub const SYSTEM_TAG: &str = "system";

/// Second element marking a literal escape.
pub const LITERAL_TAG: &str = "literal";

/// Target type of an environment value cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastType {
    /// Keep the raw string
    #[default]
    String,
    /// Base-10 signed integer
    Integer,
    /// Decimal floating point
    Float,
    /// Symbolic identifier
    Atom,
    /// `"true"` is true, anything else is false
    Boolean,
}

impl CastType {
    /// The option name for this type.
    pub fn name(&self) -> &'static str {
        match self {
            CastType::String => "string",
            CastType::Integer => "integer",
            CastType::Float => "float",
            CastType::Atom => "atom",
            CastType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CastType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(CastType::String),
            "integer" => Ok(CastType::Integer),
            "float" => Ok(CastType::Float),
            "atom" => Ok(CastType::Atom),
            "boolean" => Ok(CastType::Boolean),
            other => Err(format!("unknown type '{}'", other)),
        }
    }
}

/// Reference to a registered transform, `namespace.function`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransformRef {
    pub namespace: String,
    pub function: String,
}

impl TransformRef {
    pub fn new(namespace: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.function)
    }
}

/// Options attached to an environment lookup.
///
/// # Example
///
/// ```
/// use bootconf::{CastType, ResolveOptions, Value};
///
/// let port = Value::env_with(
///     "PORT",
///     ResolveOptions::new().kind(CastType::Integer).default_value(4000),
/// );
/// assert!(port.as_tuple().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolveOptions {
    /// Cast applied to the raw environment string
    pub kind: CastType,
    /// Injected as-is when the variable is unset
    pub default: Option<Value>,
    /// Fail instead of defaulting when the variable is unset
    pub required: bool,
    /// Post-processing applied to values read from the environment
    pub transform: Option<TransformRef>,
}

impl ResolveOptions {
    /// Default options: string type, no default, not required, no transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cast type.
    pub fn kind(mut self, kind: CastType) -> Self {
        self.kind = kind;
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the lookup as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the transform reference.
    pub fn transform(mut self, namespace: impl Into<String>, function: impl Into<String>) -> Self {
        self.transform = Some(TransformRef::new(namespace, function));
        self
    }

    /// Render these options in their keyword-sequence surface form.
    ///
    /// Only options that differ from the defaults are written.
    pub fn to_value(&self) -> Value {
        let mut entries: Vec<(&str, Value)> = Vec::new();
        if self.kind != CastType::String {
            entries.push(("type", Value::atom(self.kind.name())));
        }
        if let Some(default) = &self.default {
            entries.push(("default", default.clone()));
        }
        if self.required {
            entries.push(("required", Value::Bool(true)));
        }
        if let Some(transform) = &self.transform {
            entries.push((
                "transform",
                Value::pair(
                    Value::atom(transform.namespace.as_str()),
                    Value::atom(transform.function.as_str()),
                ),
            ));
        }
        Value::keyword(entries)
    }

    /// Parse options from their surface form for the lookup of `name`.
    ///
    /// Accepts a mapping or a keyword sequence. Keys may be atoms or strings.
    /// Unknown keys are ignored with a warning; malformed values of known
    /// keys are an error.
    pub fn from_value(name: &str, value: &Value) -> Result<Self, ResolveError> {
        let invalid = |reason: String| ResolveError::InvalidOptions {
            name: name.to_string(),
            reason,
        };

        let entries: Vec<(&Value, &Value)> = match value {
            Value::Mapping(m) => m.iter().collect(),
            Value::Sequence(items) => items
                .iter()
                .map(|item| match item.as_tuple() {
                    Some([k, v]) => Ok((k, v)),
                    _ => Err(invalid(
                        "options list entries must be (key, value) pairs".to_string(),
                    )),
                })
                .collect::<Result<_, _>>()?,
            other => {
                return Err(invalid(format!(
                    "options must be a mapping or keyword list, got {}",
                    other.type_name()
                )))
            }
        };

        let mut options = ResolveOptions::new();
        for (key, option) in entries {
            let key_name = key
                .key_name()
                .ok_or_else(|| invalid(format!("option keys must be names, got {}", key.type_name())))?;
            match key_name {
                "type" => {
                    let type_name = option
                        .key_name()
                        .ok_or_else(|| invalid(format!("type must be a name, got {}", option.type_name())))?;
                    options.kind = type_name.parse().map_err(invalid)?;
                }
                "default" => options.default = Some(option.clone()),
                "required" => {
                    options.required = option
                        .as_bool()
                        .ok_or_else(|| invalid(format!("required must be a boolean, got {}", option.type_name())))?;
                }
                "transform" => {
                    let parts: &[Value] = match option {
                        Value::Tuple(parts) | Value::Sequence(parts) => parts.as_slice(),
                        _ => &[],
                    };
                    match parts {
                        [namespace, function] => match (namespace.key_name(), function.key_name()) {
                            (Some(namespace), Some(function)) => {
                                options.transform = Some(TransformRef::new(namespace, function));
                            }
                            _ => {
                                return Err(invalid(
                                    "transform must name a namespace and a function".to_string(),
                                ))
                            }
                        },
                        _ => {
                            return Err(invalid(
                                "transform must be a (namespace, function) pair".to_string(),
                            ))
                        }
                    }
                }
                other => {
                    tracing::warn!(variable = name, option = other, "ignoring unknown placeholder option");
                }
            }
        }
        Ok(options)
    }
}

/// A recognized placeholder, borrowing from the tuple it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Placeholder<'a> {
    /// Read `name` from the environment
    EnvLookup {
        name: &'a str,
        options: ResolveOptions,
    },
    /// Resolve to `inner` without inspecting it
    Literal(&'a Value),
}

impl<'a> Placeholder<'a> {
    /// Recognize a placeholder in the elements of a tuple.
    ///
    /// Returns `Ok(None)` for tuples that are plain data. Fails only when a
    /// tuple is unambiguously an environment lookup but its options are
    /// malformed.
    pub fn parse(elements: &'a [Value]) -> Result<Option<Self>, ResolveError> {
        let Some((tag, rest)) = elements.split_first() else {
            return Ok(None);
        };
        if !matches!(tag, Value::Atom(atom) if atom.as_str() == SYSTEM_TAG) {
            return Ok(None);
        }

        match rest {
            [Value::String(name)] => Ok(Some(Placeholder::EnvLookup {
                name,
                options: ResolveOptions::new(),
            })),
            [Value::Atom(marker), inner] if marker.as_str() == LITERAL_TAG => {
                Ok(Some(Placeholder::Literal(inner)))
            }
            [Value::String(name), options] => Ok(Some(Placeholder::EnvLookup {
                name,
                options: ResolveOptions::from_value(name, options)?,
            })),
            _ => Ok(None),
        }
    }
}
