//! Bound parameter values.
//!
//! Every placeholder written by the compiler is paired with one `BoundValue`.
//! Values are already coerced to their final shape (pattern wildcards applied,
//! timestamps decoded, arrays encoded) by the time they land here, so binding
//! them to a driver is a mechanical step.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;

use crate::criterion::ScalarKind;
use crate::{CriteriaError, Result};

/// A parameter value bound to a `$N` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Big integer (BIGINT)
    BigInt(i64),
    /// Double-precision float (DOUBLE PRECISION)
    Double(f64),
    /// Text (TEXT)
    String(String),
    /// Timestamp with timezone (TIMESTAMPTZ)
    TimestampTz(DateTime<Utc>),
    /// Native PostgreSQL array of the given element kind
    Array(ScalarKind, Vec<BoundValue>),
    /// JSONB document, used for JSON-encoded arrays
    Json(JsonValue),
}

impl BoundValue {
    /// Returns the PostgreSQL type name for this value.
    pub fn pg_type_name(&self) -> &'static str {
        match self {
            BoundValue::BigInt(_) => "BIGINT",
            BoundValue::Double(_) => "DOUBLE PRECISION",
            BoundValue::String(_) => "TEXT",
            BoundValue::TimestampTz(_) => "TIMESTAMPTZ",
            BoundValue::Array(kind, values) if !is_homogeneous(*kind, values) => "ARRAY",
            BoundValue::Array(kind, _) => match kind {
                ScalarKind::Int64 => "BIGINT[]",
                ScalarKind::Float64 => "DOUBLE PRECISION[]",
                ScalarKind::String => "TEXT[]",
                ScalarKind::Timestamp => "TIMESTAMPTZ[]",
            },
            BoundValue::Json(_) => "JSONB",
        }
    }

    /// Renders the value the way PostgreSQL prints it as a literal.
    ///
    /// Arrays use the `{a,b}` array syntax with strings double-quoted and
    /// escaped; JSON values render as compact JSON text.
    pub fn to_literal(&self) -> String {
        match self {
            BoundValue::BigInt(v) => v.to_string(),
            BoundValue::Double(v) if v.is_nan() => "NaN".to_string(),
            BoundValue::Double(v) if v.is_infinite() && *v > 0.0 => "Infinity".to_string(),
            BoundValue::Double(v) if v.is_infinite() => "-Infinity".to_string(),
            BoundValue::Double(v) => v.to_string(),
            BoundValue::String(v) => v.clone(),
            BoundValue::TimestampTz(v) => v.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            BoundValue::Array(_, values) => {
                let elements: Vec<String> = values
                    .iter()
                    .map(|v| match v {
                        BoundValue::String(s) => quote_array_element(s),
                        BoundValue::TimestampTz(_) => quote_array_element(&v.to_literal()),
                        other => other.to_literal(),
                    })
                    .collect();
                format!("{{{}}}", elements.join(","))
            }
            BoundValue::Json(v) => v.to_string(),
        }
    }

    /// Converts the value to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite floats, which JSON cannot represent.
    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(match self {
            BoundValue::BigInt(v) => JsonValue::Number((*v).into()),
            BoundValue::Double(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .ok_or_else(|| {
                    CriteriaError::Serialization(format!("{} has no JSON representation", v))
                })?,
            BoundValue::String(v) => JsonValue::String(v.clone()),
            BoundValue::TimestampTz(v) => {
                JsonValue::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            BoundValue::Array(_, values) => JsonValue::Array(
                values.iter().map(BoundValue::to_json).collect::<Result<Vec<_>>>()?,
            ),
            BoundValue::Json(v) => v.clone(),
        })
    }

    /// Binds this value into sqlx PostgreSQL arguments.
    ///
    /// # Errors
    ///
    /// Returns error if binding fails (e.g., type incompatibility).
    pub fn bind_to_arguments(&self, arguments: &mut PgArguments) -> Result<()> {
        match self {
            BoundValue::BigInt(v) => {
                arguments.add(*v)
                    .map_err(|e| CriteriaError::Binding(format!("Failed to bind BIGINT: {}", e)))?;
            }
            BoundValue::Double(v) => {
                arguments.add(*v)
                    .map_err(|e| CriteriaError::Binding(format!("Failed to bind DOUBLE: {}", e)))?;
            }
            BoundValue::String(v) => {
                arguments.add(v.clone())
                    .map_err(|e| CriteriaError::Binding(format!("Failed to bind STRING: {}", e)))?;
            }
            BoundValue::TimestampTz(v) => {
                arguments.add(*v)
                    .map_err(|e| CriteriaError::Binding(format!("Failed to bind TIMESTAMPTZ: {}", e)))?;
            }
            BoundValue::Json(v) => {
                arguments.add(v.clone())
                    .map_err(|e| CriteriaError::Binding(format!("Failed to bind JSON: {}", e)))?;
            }
            BoundValue::Array(kind, values) => {
                // Arrays whose elements all match their kind bind as native
                // PostgreSQL arrays (INT8[], TEXT[], ...), empty ones included.
                // Anything else falls back to JSONB.
                if !is_homogeneous(*kind, values) {
                    arguments.add(self.to_json()?)
                        .map_err(|e| CriteriaError::Binding(format!("Failed to bind ARRAY as JSON: {}", e)))?;
                    return Ok(());
                }
                match kind {
                    ScalarKind::Int64 => {
                        let array: Vec<i64> = values.iter().filter_map(|v| match v {
                            BoundValue::BigInt(i) => Some(*i),
                            _ => None,
                        }).collect();
                        arguments.add(array)
                            .map_err(|e| CriteriaError::Binding(format!("Failed to bind INT8[]: {}", e)))?;
                    }
                    ScalarKind::Float64 => {
                        let array: Vec<f64> = values.iter().filter_map(|v| match v {
                            BoundValue::Double(f) => Some(*f),
                            _ => None,
                        }).collect();
                        arguments.add(array)
                            .map_err(|e| CriteriaError::Binding(format!("Failed to bind FLOAT8[]: {}", e)))?;
                    }
                    ScalarKind::String => {
                        let array: Vec<String> = values.iter().filter_map(|v| match v {
                            BoundValue::String(s) => Some(s.clone()),
                            _ => None,
                        }).collect();
                        arguments.add(array)
                            .map_err(|e| CriteriaError::Binding(format!("Failed to bind TEXT[]: {}", e)))?;
                    }
                    ScalarKind::Timestamp => {
                        let array: Vec<DateTime<Utc>> = values.iter().filter_map(|v| match v {
                            BoundValue::TimestampTz(t) => Some(*t),
                            _ => None,
                        }).collect();
                        arguments.add(array)
                            .map_err(|e| CriteriaError::Binding(format!("Failed to bind TIMESTAMPTZ[]: {}", e)))?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Whether every element of an array has the scalar type of its kind.
fn is_homogeneous(kind: ScalarKind, values: &[BoundValue]) -> bool {
    values.iter().all(|v| {
        matches!(
            (kind, v),
            (ScalarKind::Int64, BoundValue::BigInt(_))
                | (ScalarKind::Float64, BoundValue::Double(_))
                | (ScalarKind::String, BoundValue::String(_))
                | (ScalarKind::Timestamp, BoundValue::TimestampTz(_))
        )
    })
}

fn quote_array_element(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

impl From<i64> for BoundValue {
    fn from(v: i64) -> Self {
        BoundValue::BigInt(v)
    }
}

impl From<f64> for BoundValue {
    fn from(v: f64) -> Self {
        BoundValue::Double(v)
    }
}

impl From<String> for BoundValue {
    fn from(v: String) -> Self {
        BoundValue::String(v)
    }
}

impl From<&str> for BoundValue {
    fn from(v: &str) -> Self {
        BoundValue::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for BoundValue {
    fn from(v: DateTime<Utc>) -> Self {
        BoundValue::TimestampTz(v)
    }
}
