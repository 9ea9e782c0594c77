//! Array operand encoding.
//!
//! Array operators bind their whole value list as one parameter, either as a
//! native PostgreSQL array (`{a,b}`) or as a JSON array (`["a","b"]`) for
//! JSONB columns.

use serde_json::Value as JsonValue;

use crate::criterion::{ScalarKind, ScalarValue};
use crate::types::BoundValue;
use crate::{CriteriaError, Result};

/// Encodes a value list of the given kind as one bound array.
///
/// # Errors
///
/// Returns `UnsupportedOperation` for kinds without an array encoding
/// (timestamps), and `Serialization` when a value has no JSON form.
pub fn encode(kind: ScalarKind, values: Vec<BoundValue>, as_json: bool) -> Result<BoundValue> {
    if !kind.is_array_encodable() {
        return Err(CriteriaError::UnsupportedOperation(format!(
            "{} values cannot be encoded as an array",
            kind
        )));
    }

    if as_json {
        let elements = values
            .iter()
            .map(BoundValue::to_json)
            .collect::<Result<Vec<_>>>()?;
        Ok(BoundValue::Json(JsonValue::Array(elements)))
    } else {
        Ok(BoundValue::Array(kind, values))
    }
}

/// Converts typed values and encodes them as one bound array.
pub fn encode_values<V: ScalarValue>(values: &[V], as_json: bool) -> Result<BoundValue> {
    let bound = values
        .iter()
        .map(ScalarValue::to_bound)
        .collect::<Result<Vec<_>>>()?;
    encode(V::KIND, bound, as_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::Timestamp;
    use serde_json::json;

    #[test]
    fn test_native_int_array() {
        let encoded = encode_values(&[1i64, 2, 3], false).unwrap();
        assert_eq!(encoded.to_literal(), "{1,2,3}");
        assert_eq!(encoded.pg_type_name(), "BIGINT[]");
    }

    #[test]
    fn test_json_string_array() {
        let values = vec!["a".to_string(), "b".to_string()];
        let encoded = encode_values(&values, true).unwrap();
        assert_eq!(encoded, BoundValue::Json(json!(["a", "b"])));
        assert_eq!(encoded.to_literal(), r#"["a","b"]"#);
    }

    #[test]
    fn test_json_float_array() {
        let encoded = encode_values(&[1.5f64, -2.0], true).unwrap();
        assert_eq!(encoded, BoundValue::Json(json!([1.5, -2.0])));
    }

    #[test]
    fn test_empty_arrays() {
        assert_eq!(encode_values::<i64>(&[], false).unwrap().to_literal(), "{}");
        assert_eq!(encode_values::<i64>(&[], true).unwrap().to_literal(), "[]");
    }

    #[test]
    fn test_empty_native_arrays_keep_their_kind() {
        let ints = encode_values::<i64>(&[], false).unwrap();
        assert_eq!(ints, BoundValue::Array(ScalarKind::Int64, vec![]));
        assert_eq!(ints.pg_type_name(), "BIGINT[]");

        let floats = encode_values::<f64>(&[], false).unwrap();
        assert_eq!(floats.pg_type_name(), "DOUBLE PRECISION[]");

        let strings = encode_values::<String>(&[], false).unwrap();
        assert_eq!(strings.pg_type_name(), "TEXT[]");
        assert_eq!(strings.to_literal(), "{}");
    }

    #[test]
    fn test_timestamp_is_unsupported() {
        let err = encode_values(&[Timestamp::new(0, 0)], false).unwrap_err();
        assert!(matches!(err, CriteriaError::UnsupportedOperation(_)));
        let err = encode(ScalarKind::Timestamp, vec![], true).unwrap_err();
        assert!(matches!(err, CriteriaError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_json_rejects_non_finite() {
        let err = encode_values(&[f64::INFINITY], true).unwrap_err();
        assert!(matches!(err, CriteriaError::Serialization(_)));
        assert!(encode_values(&[f64::INFINITY], false).is_ok());
    }
}
