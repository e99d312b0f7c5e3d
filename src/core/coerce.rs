// src/core/coerce.rs

//! Coerces matched values to the type declared by an expression's tag.
//!
//! A matched `Null` stays `Null` under any scalar tag; a value that cannot
//! convert fails with `BatchError::TypeCoercion`.

use crate::core::errors::BatchError;
use crate::core::expression::TypeTag;
use serde_json::{Number, Value};

/// Coerces a single matched value to a scalar tag. `obj` is handled by the
/// caller since its cardinality rules differ.
pub fn coerce_value(value: &Value, tag: TypeTag) -> Result<Value, BatchError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match tag {
        TypeTag::Str => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Number(n) => Ok(Value::String(format_json_number(n))),
            _ => Err(coercion_error(value, tag)),
        },
        TypeTag::Int => {
            let n = integral_from_value(value).ok_or_else(|| coercion_error(value, tag))?;
            if i32::try_from(n).is_err() {
                return Err(coercion_error(value, tag));
            }
            Ok(Value::Number(Number::from(n)))
        }
        TypeTag::Long => {
            let n = integral_from_value(value).ok_or_else(|| coercion_error(value, tag))?;
            Ok(Value::Number(Number::from(n)))
        }
        TypeTag::Double => {
            let f = float_from_value(value).ok_or_else(|| coercion_error(value, tag))?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| coercion_error(value, tag))
        }
        TypeTag::Bool => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(coercion_error(value, tag)),
        },
        TypeTag::Obj => Ok(value.clone()),
    }
}

/// Converts the result of an aggregate back into the requested numeric tag.
pub fn number_from_f64(n: f64, tag: TypeTag) -> Result<Value, BatchError> {
    match tag {
        TypeTag::Int => {
            if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
                Ok(Value::Number(Number::from(n as i64)))
            } else {
                Err(BatchError::TypeCoercion {
                    target: tag.name(),
                    value: n.to_string(),
                })
            }
        }
        TypeTag::Long => {
            // `i64::MAX as f64` rounds up to 2^63, which does not fit, so the
            // upper bound must be exclusive.
            if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
                Ok(Value::Number(Number::from(n as i64)))
            } else {
                Err(BatchError::TypeCoercion {
                    target: tag.name(),
                    value: n.to_string(),
                })
            }
        }
        TypeTag::Double => Number::from_f64(n)
            .map(Value::Number)
            .ok_or(BatchError::TypeCoercion {
                target: tag.name(),
                value: n.to_string(),
            }),
        _ => Err(BatchError::TypeMismatch(format!(
            "aggregate results can only be coerced to a numeric type, not \"{}\"",
            tag.name()
        ))),
    }
}

/// Collects aggregate input as floats. A match that is itself an array is
/// flattened one level, so both `$.a[*].n` and `$.a.ns` feed an aggregate.
pub fn numeric_matches(matches: &[Value]) -> Result<Vec<f64>, BatchError> {
    let mut numbers = Vec::with_capacity(matches.len());
    for value in matches {
        match value {
            Value::Array(items) => {
                for item in items {
                    numbers.push(require_number(item)?);
                }
            }
            other => numbers.push(require_number(other)?),
        }
    }
    Ok(numbers)
}

fn require_number(value: &Value) -> Result<f64, BatchError> {
    value.as_f64().ok_or_else(|| {
        BatchError::TypeMismatch(format!("aggregate input must be numeric, got {value}"))
    })
}

/// Renders a resolved scalar to its textual form for inline splicing.
pub fn value_to_text(value: &Value) -> Result<String, BatchError> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(format_json_number(n)),
        Value::String(s) => Ok(s.clone()),
        _ => Err(BatchError::TypeCoercion {
            target: "str",
            value: value.to_string(),
        }),
    }
}

/// Formats a number to a string, omitting the trailing `.0` for whole floats.
pub fn format_json_number(num: &Number) -> String {
    if num.is_f64() && num.as_f64().unwrap().fract() == 0.0 {
        num.as_i64()
            .unwrap_or_else(|| num.as_f64().unwrap() as i64)
            .to_string()
    } else {
        num.to_string()
    }
}

fn coercion_error(value: &Value, tag: TypeTag) -> BatchError {
    BatchError::TypeCoercion {
        target: tag.name(),
        value: value.to_string(),
    }
}

fn integral_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else if let Some(f) = n.as_f64()
                && f.fract() == 0.0
                && f >= i64::MIN as f64
                // Exclusive: `i64::MAX as f64` rounds up to 2^63.
                && f < i64::MAX as f64
            {
                Some(f as i64)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn float_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
