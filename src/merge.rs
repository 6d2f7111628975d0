//! Deep merge of configuration trees.
//!
//! Used to reconcile a resolved tree (the overlay) with the tree it was
//! resolved from (the base): keys missing from the overlay keep their base
//! value, and nested mappings are merged key by key.

use crate::value::{Mapping, Value};

/// Merge `overlay` into `base`, key by key. Overlay values win on conflict.
///
/// Base key order is preserved; keys only present in the overlay are
/// appended in overlay order.
///
/// ```
/// use bootconf::{deep_merge, Mapping};
///
/// let base = Mapping::new()
///     .with("a", 1)
///     .with("b", Mapping::new().with("x", 1).with("y", 2));
/// let overlay = Mapping::new().with("b", Mapping::new().with("x", 9));
///
/// let merged = deep_merge(base, overlay);
/// assert_eq!(
///     merged,
///     Mapping::new()
///         .with("a", 1)
///         .with("b", Mapping::new().with("x", 9).with("y", 2))
/// );
/// ```
pub fn deep_merge(base: Mapping, overlay: Mapping) -> Mapping {
    let mut merged = base;
    for (key, value) in overlay {
        match merged.get_mut(&key) {
            Some(slot) => {
                let existing = std::mem::take(slot);
                *slot = deep_merge_value(existing, value);
            }
            None => {
                merged.insert(key, value);
            }
        }
    }
    merged
}

/// Merge two values.
///
/// - two mappings merge recursively;
/// - two keyword sequences merge entry by entry (see below);
/// - two records with the same tag merge field by field;
/// - anything else is replaced outright by `overlay`.
///
/// Keyword sequences may repeat a key. Each overlay entry is paired with the
/// first base entry under the same key that is not already paired, and the
/// pair is merged. Base entries left unpaired come first in their original
/// order, followed by the overlay entries in overlay order, so no entry of
/// either side is lost.
///
/// ```
/// use bootconf::{deep_merge_value, Value};
///
/// let base = Value::keyword([("plug", Value::atom("Logger")), ("plug", Value::atom("Auth"))]);
/// let merged = deep_merge_value(base.clone(), base.clone());
/// assert_eq!(merged, base);
/// ```
pub fn deep_merge_value(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            Value::Mapping(deep_merge(base, overlay))
        }
        (base @ Value::Sequence(_), overlay @ Value::Sequence(_))
            if base.is_keyword() && overlay.is_keyword() =>
        {
            Value::Sequence(merge_keyword(keyword_entries(base), keyword_entries(overlay)))
        }
        (Value::Record(mut base), Value::Record(overlay)) if base.tag() == overlay.tag() => {
            for (name, value) in overlay.into_fields() {
                let merged = match base.get(&name) {
                    Some(existing) => deep_merge_value(existing.clone(), value),
                    None => value,
                };
                base.set(name, merged);
            }
            Value::Record(base)
        }
        (_, overlay) => overlay,
    }
}

fn merge_keyword(base: Vec<(Value, Value)>, overlay: Vec<(Value, Value)>) -> Vec<Value> {
    let mut unpaired: Vec<Option<(Value, Value)>> = base.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(overlay.len());

    for (key, value) in overlay {
        let paired = unpaired
            .iter_mut()
            .find(|slot| matches!(slot, Some((k, _)) if *k == key))
            .and_then(|slot| slot.take());
        let value = match paired {
            Some((_, existing)) => deep_merge_value(existing, value),
            None => value,
        };
        merged.push((key, value));
    }

    unpaired
        .into_iter()
        .flatten()
        .chain(merged)
        .map(|(k, v)| Value::Tuple(vec![k, v]))
        .collect()
}

fn keyword_entries(keyword: Value) -> Vec<(Value, Value)> {
    let Value::Sequence(items) = keyword else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Tuple(pair) => {
                let mut pair = pair.into_iter();
                Some((pair.next()?, pair.next()?))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    #[test]
    fn test_nested_mappings_merge() {
        let base = Mapping::new()
            .with("a", 1)
            .with("b", Mapping::new().with("x", 1).with("y", 2));
        let overlay = Mapping::new().with("b", Mapping::new().with("x", 9));

        assert_eq!(
            deep_merge(base, overlay),
            Mapping::new()
                .with("a", 1)
                .with("b", Mapping::new().with("x", 9).with("y", 2))
        );
    }

    #[test]
    fn test_new_keys_are_appended() {
        let merged = deep_merge(
            Mapping::new().with("a", 1),
            Mapping::new().with("c", 3).with("b", 2),
        );
        let keys: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("c"), Value::from("b")]);
    }

    #[test]
    fn test_keyword_sequences_merge_by_key() {
        let base = Value::keyword([("host", Value::from("a")), ("port", Value::Integer(1))]);
        let overlay = Value::keyword([("port", Value::Integer(2)), ("ssl", Value::Bool(true))]);

        assert_eq!(
            deep_merge_value(base, overlay),
            Value::keyword([
                ("host", Value::from("a")),
                ("port", Value::Integer(2)),
                ("ssl", Value::Bool(true)),
            ])
        );
    }

    #[test]
    fn test_keyword_repeated_keys_survive_merge() {
        let base = Value::keyword([
            ("plug", Value::atom("Logger")),
            ("plug", Value::atom("Auth")),
            ("host", Value::env("HOST")),
        ]);
        let overlay = Value::keyword([
            ("plug", Value::atom("Logger")),
            ("plug", Value::atom("Auth")),
            ("host", Value::from("example.com")),
        ]);

        assert_eq!(
            deep_merge_value(base, overlay),
            Value::keyword([
                ("plug", Value::atom("Logger")),
                ("plug", Value::atom("Auth")),
                ("host", Value::from("example.com")),
            ])
        );

        let config = Mapping::new().with("k", Value::keyword([("a", 1), ("a", 2)]));
        assert_eq!(deep_merge(config.clone(), config.clone()), config);
    }

    #[test]
    fn test_keyword_repeats_pair_up_in_order() {
        let base = Value::keyword([("a", 1), ("b", 2), ("a", 3)]);
        let overlay = Value::keyword([("a", 10), ("c", 4), ("a", 30), ("a", 50)]);

        assert_eq!(
            deep_merge_value(base, overlay),
            Value::keyword([("b", 2), ("a", 10), ("c", 4), ("a", 30), ("a", 50)])
        );
    }

    #[test]
    fn test_nested_keyword_inside_mapping() {
        let base = Mapping::new().with(
            Value::atom("repo"),
            Value::keyword([
                ("pool_size", Value::Integer(10)),
                ("url", Value::env("DATABASE_URL")),
            ]),
        );
        let overlay = Mapping::new().with(
            Value::atom("repo"),
            Value::keyword([("url", Value::from("postgres://db"))]),
        );

        let merged = deep_merge(base, overlay);
        assert_eq!(
            merged.get(&Value::atom("repo")),
            Some(&Value::keyword([
                ("pool_size", Value::Integer(10)),
                ("url", Value::from("postgres://db")),
            ]))
        );
    }

    #[test]
    fn test_plain_sequences_are_replaced() {
        let merged = deep_merge_value(Value::from(vec![1, 2, 3]), Value::from(vec![4]));
        assert_eq!(merged, Value::from(vec![4]));

        let keyword = Value::keyword([("a", 1)]);
        let plain = Value::from(vec!["x"]);
        assert_eq!(deep_merge_value(keyword, plain.clone()), plain);
    }

    #[test]
    fn test_mismatched_shapes_take_overlay() {
        assert_eq!(
            deep_merge_value(Value::Mapping(Mapping::new().with("a", 1)), Value::Integer(5)),
            Value::Integer(5)
        );
        assert_eq!(
            deep_merge_value(Value::Integer(5), Value::Nil),
            Value::Nil
        );
    }

    #[test]
    fn test_records_with_same_tag_merge_fields() {
        let base = Value::Record(Record::new("Endpoint").field("host", "a").field("port", 80));
        let overlay = Value::Record(Record::new("Endpoint").field("port", 443));
        assert_eq!(
            deep_merge_value(base, overlay),
            Value::Record(Record::new("Endpoint").field("host", "a").field("port", 443))
        );

        let other = Value::Record(Record::new("Other").field("port", 1));
        let base = Value::Record(Record::new("Endpoint").field("host", "a"));
        assert_eq!(deep_merge_value(base, other.clone()), other);
    }

    #[test]
    fn test_empty_overlay_is_identity() {
        let base = Mapping::new()
            .with("a", 1)
            .with("b", Mapping::new().with("c", Value::range(1, 5)));
        assert_eq!(deep_merge(base.clone(), Mapping::new()), base);
    }
}
