//! Value types for configuration trees.
//!
//! This module provides the `Value` enum, the single closed representation of
//! everything that can appear inside a configuration tree: scalars, ordered
//! sequences, tuples, key-keyed mappings, tagged records and opaque ranges.
//!
//! Placeholders are not a separate variant. They are written as tuples whose
//! first element is the reserved atom `system` (see [`crate::placeholder`]), so
//! the resolver sees exactly what the configuration author wrote.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use indexmap::IndexMap;

use crate::placeholder::{ResolveOptions, LITERAL_TAG, SYSTEM_TAG};

/// A symbolic identifier.
///
/// Atoms compare by name and are used for reserved tags, keyword keys and
/// option names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(String);

impl Atom {
    /// Intern a name as an atom.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The atom's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// An insertion-ordered mapping with unique keys.
///
/// Keys are arbitrary values. Inserting an existing key replaces its value in
/// place, so the original order survives a rewrite of the tree. Equality
/// ignores order.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: IndexMap<Value, Value>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert an entry, returning the previous value for the key if any.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Get a value whose key is the atom or the string `name`.
    ///
    /// The atom key is tried first.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.get(&Value::atom(name))
            .or_else(|| self.get(&Value::from(name)))
    }

    /// Remove an entry, returning its value. The order of the other entries
    /// is kept.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Check if `key` is present.
    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys()
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Value, &Value) -> bool) {
        self.entries.retain(|k, v| keep(k, v));
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Mapping {}

impl Hash for Mapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent to agree with `PartialEq`.
        let combined = self.entries.iter().fold(0u64, |acc, entry| {
            let mut hasher = DefaultHasher::new();
            entry.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        self.len().hash(state);
        combined.hash(state);
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl IntoIterator for Mapping {
    type Item = (Value, Value);
    type IntoIter = indexmap::map::IntoIter<Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A named, fixed-shape structure.
///
/// Records carry a type-tag and named fields. Some tags are opaque to the
/// resolver and are never traversed (see [`crate::resolver::OpaqueTypes`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    tag: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            fields: Vec::new(),
        }
    }

    /// Add or replace a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Add or replace a field in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// The record's type-tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate over fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Consume the record, returning its fields.
    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}

/// Raw value representation for configuration trees.
///
/// Values are hashable so they can key a [`Mapping`]. Floats compare and hash
/// by their bit pattern: `NaN` equals itself and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Nil/absent value
    #[default]
    Nil,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Symbolic identifier
    Atom(Atom),
    /// Ordered list of values
    Sequence(Vec<Value>),
    /// Fixed-size ordered structure; placeholders are tuples
    Tuple(Vec<Value>),
    /// Key-keyed mapping
    Mapping(Mapping),
    /// Tagged record
    Record(Record),
    /// Opaque integer interval, never traversed
    Range { start: i64, end: i64 },
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (
                Value::Range { start, end },
                Value::Range {
                    start: other_start,
                    end: other_end,
                },
            ) => start == other_start && end == other_end,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Atom(a) => a.hash(state),
            Value::Sequence(items) | Value::Tuple(items) => items.hash(state),
            Value::Mapping(m) => m.hash(state),
            Value::Record(r) => r.hash(state),
            Value::Range { start, end } => {
                start.hash(state);
                end.hash(state);
            }
        }
    }
}

impl Value {
    /// Create an atom value.
    pub fn atom(name: impl Into<String>) -> Self {
        Value::Atom(Atom::new(name))
    }

    /// Create a tuple value.
    pub fn tuple(elements: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(elements.into_iter().collect())
    }

    /// Create a two-element tuple.
    pub fn pair(first: impl Into<Value>, second: impl Into<Value>) -> Self {
        Value::Tuple(vec![first.into(), second.into()])
    }

    /// Create a keyword sequence: a list of `(atom, value)` pairs.
    pub fn keyword<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Sequence(
            entries
                .into_iter()
                .map(|(k, v)| Value::pair(Value::atom(k), v))
                .collect(),
        )
    }

    /// Create an opaque range value.
    pub fn range(start: i64, end: i64) -> Self {
        Value::Range { start, end }
    }

    /// Placeholder reading `name` from the environment with default options.
    ///
    /// ```
    /// use bootconf::Value;
    ///
    /// let host = Value::env("HOST");
    /// assert_eq!(host, Value::pair(Value::atom("system"), "HOST"));
    /// ```
    pub fn env(name: impl Into<String>) -> Self {
        Value::pair(Value::atom(SYSTEM_TAG), Value::String(name.into()))
    }

    /// Placeholder reading `name` from the environment with explicit options.
    pub fn env_with(name: impl Into<String>, options: ResolveOptions) -> Self {
        Value::Tuple(vec![
            Value::atom(SYSTEM_TAG),
            Value::String(name.into()),
            options.to_value(),
        ])
    }

    /// Literal escape: resolves to `inner` verbatim.
    pub fn literal(inner: impl Into<Value>) -> Self {
        Value::Tuple(vec![
            Value::atom(SYSTEM_TAG),
            Value::atom(LITERAL_TAG),
            inner.into(),
        ])
    }

    /// Check if this value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an atom.
    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Value::Atom(a) => Some(a),
            _ => None,
        }
    }

    /// Try to get this value as a sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get this value as a tuple.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(elements) => Some(elements),
            _ => None,
        }
    }

    /// Try to get this value as a mapping.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get this value as a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Name of an atom or string usable as a lookup key.
    pub(crate) fn key_name(&self) -> Option<&str> {
        match self {
            Value::Atom(a) => Some(a.as_str()),
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this is a keyword sequence (every element an `(atom, value)` pair).
    ///
    /// The empty sequence counts as a keyword sequence.
    pub fn is_keyword(&self) -> bool {
        match self {
            Value::Sequence(items) => items.iter().all(|item| {
                matches!(item, Value::Tuple(pair) if pair.len() == 2 && matches!(pair[0], Value::Atom(_)))
            }),
            _ => false,
        }
    }

    /// Get a value by dot-notation path (e.g., "database.host").
    ///
    /// Segments match atom or string keys of mappings, keys of keyword
    /// sequences, and record field names.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        self.get_path_parts(&parts)
    }

    fn get_path_parts(&self, parts: &[&str]) -> Option<&Value> {
        let Some((first, rest)) = parts.split_first() else {
            return Some(self);
        };

        let child = match self {
            Value::Mapping(m) => m.get_named(first),
            Value::Record(r) => r.get(first),
            Value::Sequence(items) if self.is_keyword() => items
                .iter()
                .filter_map(|item| item.as_tuple())
                .find(|pair| pair[0].key_name() == Some(*first))
                .map(|pair| &pair[1]),
            _ => None,
        };
        child.and_then(|v| v.get_path_parts(rest))
    }

    /// Get a human-readable type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Atom(_) => "atom",
            Value::Sequence(_) => "sequence",
            Value::Tuple(_) => "tuple",
            Value::Mapping(_) => "mapping",
            Value::Record(_) => "record",
            Value::Range { .. } => "range",
        }
    }

    /// Render this value as JSON for diagnostics.
    ///
    /// Atoms become strings, tuples become arrays, records become objects
    /// carrying their tag under `__type__`, and non-string mapping keys are
    /// rendered with their JSON text.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Atom(a) => serde_json::Value::String(a.as_str().to_string()),
            Value::Sequence(items) | Value::Tuple(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Mapping(m) => {
                let map: serde_json::Map<String, serde_json::Value> = m
                    .iter()
                    .map(|(k, v)| {
                        let key = match k.key_name() {
                            Some(name) => name.to_string(),
                            None => k.to_json().to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect();
                serde_json::Value::Object(map)
            }
            Value::Record(r) => {
                let mut map = serde_json::Map::new();
                map.insert(
                    "__type__".to_string(),
                    serde_json::Value::String(r.tag().to_string()),
                );
                for (name, value) in r.fields() {
                    map.insert(name.to_string(), value.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Range { start, end } => serde_json::json!({ "start": start, "end": end }),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Atom> for Value {
    fn from(a: Atom) -> Self {
        Value::Atom(a)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Nil),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}
