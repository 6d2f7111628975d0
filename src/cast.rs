//! Casting raw environment strings into typed values.

use crate::placeholder::CastType;
use crate::value::{Atom, Value};

/// A raw string that does not parse as the requested type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{raw}\" is not a valid {kind}")]
pub struct CastError {
    pub kind: CastType,
    pub raw: String,
}

/// Cast `raw` into a value of type `kind`.
///
/// Only integer and float casts can fail. Integers are signed 64-bit, so a
/// well-formed number outside the `i64` range fails the same way as text
/// that is not a number. Boolean casts are permissive: `"true"` is true and
/// every other string, including typos, is false.
///
/// ```
/// use bootconf::cast::cast;
/// use bootconf::{CastType, Value};
///
/// assert_eq!(cast("4321", CastType::Integer), Ok(Value::Integer(4321)));
/// assert_eq!(cast("yes", CastType::Boolean), Ok(Value::Bool(false)));
/// ```
pub fn cast(raw: &str, kind: CastType) -> Result<Value, CastError> {
    let fail = || CastError {
        kind,
        raw: raw.to_string(),
    };

    match kind {
        CastType::String => Ok(Value::String(raw.to_string())),
        CastType::Integer => raw.parse::<i64>().map(Value::Integer).map_err(|_| fail()),
        CastType::Float => {
            // f64::from_str also accepts "inf" and "NaN"; only decimal notation is allowed here.
            if !is_decimal(raw) {
                return Err(fail());
            }
            raw.parse::<f64>().map(Value::Float).map_err(|_| fail())
        }
        CastType::Atom => Ok(Value::Atom(Atom::new(raw))),
        CastType::Boolean => Ok(Value::Bool(raw == "true")),
    }
}

fn is_decimal(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}
