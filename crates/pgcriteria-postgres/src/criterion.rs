//! Typed, nullable query criteria.
//!
//! A criterion is a filter condition on one column: an operator, its
//! operand value(s), and the negation/case flags. It is a plain data holder;
//! the compiler turns it into SQL.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::BoundValue;
use crate::{CriteriaError, Result};

/// Query comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// IS NULL
    #[default]
    Null,
    /// Equal (=)
    Equal,
    /// Greater than (>)
    Greater,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than (<)
    Less,
    /// Less than or equal (<=)
    LessEqual,
    /// Exclusive range, rewritten into GREATER AND LESS
    Between,
    /// IN list
    In,
    /// Array/JSONB contains @>
    Contains,
    /// Array/JSONB contained by <@
    IsContainedBy,
    /// Array overlap &&
    Overlap,
    /// JSONB any key exists ?|
    HasAnyElement,
    /// JSONB all keys exist ?&
    HasAllElements,
    /// JSONB key exists ?
    HasElement,
    /// LIKE '%v%'
    Substring,
    /// LIKE 'v%'
    HasPrefix,
    /// LIKE '%v'
    HasSuffix,
}

impl QueryType {
    /// Returns the wire name of the query type.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Null => "NULL",
            QueryType::Equal => "EQUAL",
            QueryType::Greater => "GREATER",
            QueryType::GreaterEqual => "GREATER_EQUAL",
            QueryType::Less => "LESS",
            QueryType::LessEqual => "LESS_EQUAL",
            QueryType::Between => "BETWEEN",
            QueryType::In => "IN",
            QueryType::Contains => "CONTAINS",
            QueryType::IsContainedBy => "IS_CONTAINED_BY",
            QueryType::Overlap => "OVERLAP",
            QueryType::HasAnyElement => "HAS_ANY_ELEMENT",
            QueryType::HasAllElements => "HAS_ALL_ELEMENTS",
            QueryType::HasElement => "HAS_ELEMENT",
            QueryType::Substring => "SUBSTRING",
            QueryType::HasPrefix => "HAS_PREFIX",
            QueryType::HasSuffix => "HAS_SUFFIX",
        }
    }

    /// Set operators are negated with a `NOT ` prefix in front of the selector
    /// instead of a complementary operator.
    pub fn is_set_operator(&self) -> bool {
        matches!(
            self,
            QueryType::Contains
                | QueryType::IsContainedBy
                | QueryType::Overlap
                | QueryType::HasAnyElement
                | QueryType::HasAllElements
                | QueryType::HasElement
        )
    }

    /// Operators whose operand is the whole value list, encoded as one array.
    pub fn is_array_operator(&self) -> bool {
        self.is_set_operator() && *self != QueryType::HasElement
    }

    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            QueryType::Substring | QueryType::HasPrefix | QueryType::HasSuffix
        )
    }

    /// Returns the SQL operator text, including its surrounding spaces.
    ///
    /// `Between` has no operator of its own and returns an empty string.
    pub fn operator(&self, negation: bool, insensitive: bool) -> &'static str {
        match (self, negation) {
            (QueryType::Null, false) => " IS NULL",
            (QueryType::Null, true) => " IS NOT NULL",
            (QueryType::Equal, false) => " = ",
            (QueryType::Equal, true) => " <> ",
            (QueryType::Greater, false) => " > ",
            (QueryType::Greater, true) => " <= ",
            (QueryType::GreaterEqual, false) => " >= ",
            (QueryType::GreaterEqual, true) => " < ",
            (QueryType::Less, false) => " < ",
            (QueryType::Less, true) => " >= ",
            (QueryType::LessEqual, false) => " <= ",
            (QueryType::LessEqual, true) => " > ",
            (QueryType::In, false) => " IN (",
            (QueryType::In, true) => " NOT IN (",
            (QueryType::Contains, _) => " @> ",
            (QueryType::IsContainedBy, _) => " <@ ",
            (QueryType::Overlap, _) => " && ",
            (QueryType::HasAnyElement, _) => " ?| ",
            (QueryType::HasAllElements, _) => " ?& ",
            (QueryType::HasElement, _) => " ? ",
            (QueryType::Substring | QueryType::HasPrefix | QueryType::HasSuffix, negation) => {
                match (negation, insensitive) {
                    (false, false) => " LIKE ",
                    (false, true) => " ILIKE ",
                    (true, false) => " NOT LIKE ",
                    (true, true) => " NOT ILIKE ",
                }
            }
            (QueryType::Between, _) => "",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar kind of a column, deciding which criterion type applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Int64,
    Float64,
    Timestamp,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Int64 => "Int64",
            ScalarKind::Float64 => "Float64",
            ScalarKind::Timestamp => "Timestamp",
        }
    }

    /// Whether a value list of this kind has an array encoding.
    pub fn is_array_encodable(&self) -> bool {
        !matches!(self, ScalarKind::Timestamp)
    }

    /// Whether the kind has a rendering for the query type.
    pub fn supports(&self, query_type: QueryType) -> bool {
        match query_type {
            QueryType::Null
            | QueryType::Equal
            | QueryType::Greater
            | QueryType::GreaterEqual
            | QueryType::Less
            | QueryType::LessEqual
            | QueryType::Between
            | QueryType::In => true,
            QueryType::Contains
            | QueryType::IsContainedBy
            | QueryType::Overlap
            | QueryType::HasAnyElement
            | QueryType::HasAllElements
            | QueryType::HasElement => self.is_array_encodable(),
            QueryType::Substring | QueryType::HasPrefix | QueryType::HasSuffix => {
                matches!(self, ScalarKind::String)
            }
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Smallest second representable by a timestamp: 0001-01-01T00:00:00Z.
const MIN_VALID_SECONDS: i64 = -62_135_596_800;
/// First second past the representable range: 10000-01-01T00:00:00Z.
const MAX_VALID_SECONDS: i64 = 253_402_300_800;

/// Wire form of an instant: seconds since the Unix epoch plus nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(default)]
    pub seconds: i64,
    #[serde(default)]
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Decodes the wire form into a concrete instant.
    ///
    /// # Errors
    ///
    /// Returns `ValueDecoding` when `nanos` is outside `[0, 1e9)` or the
    /// instant falls outside years 1 through 9999.
    pub fn decode(&self) -> Result<DateTime<Utc>> {
        if !(0..1_000_000_000).contains(&self.nanos) {
            return Err(CriteriaError::ValueDecoding(format!(
                "timestamp {:?}: nanos not in range [0, 1e9)",
                self
            )));
        }
        if !(MIN_VALID_SECONDS..MAX_VALID_SECONDS).contains(&self.seconds) {
            return Err(CriteriaError::ValueDecoding(format!(
                "timestamp {:?}: seconds outside years 0001..=9999",
                self
            )));
        }
        DateTime::from_timestamp(self.seconds, self.nanos as u32).ok_or_else(|| {
            CriteriaError::ValueDecoding(format!("timestamp {:?} is not a valid instant", self))
        })
    }
}

impl From<DateTime<Utc>> for Timestamp {
    /// Leap seconds are clamped to the last nanosecond of their second.
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos().min(999_999_999) as i32,
        }
    }
}

/// Capabilities of a value that can appear in a criterion.
pub trait ScalarValue: Clone + fmt::Debug {
    const KIND: ScalarKind;

    /// Converts the value into its bound parameter form.
    fn to_bound(&self) -> Result<BoundValue>;

    /// Converts the value into a wildcarded LIKE pattern.
    fn to_pattern(&self, query_type: QueryType) -> Result<BoundValue> {
        Err(CriteriaError::UnsupportedQueryType(format!(
            "{} on {}",
            query_type,
            Self::KIND
        )))
    }
}

impl ScalarValue for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn to_bound(&self) -> Result<BoundValue> {
        Ok(BoundValue::String(self.clone()))
    }

    fn to_pattern(&self, query_type: QueryType) -> Result<BoundValue> {
        let pattern = match query_type {
            QueryType::Substring => format!("%{}%", self),
            QueryType::HasPrefix => format!("{}%", self),
            QueryType::HasSuffix => format!("%{}", self),
            other => {
                return Err(CriteriaError::UnsupportedQueryType(format!(
                    "{} is not a pattern query",
                    other
                )))
            }
        };
        Ok(BoundValue::String(pattern))
    }
}

impl ScalarValue for i64 {
    const KIND: ScalarKind = ScalarKind::Int64;

    fn to_bound(&self) -> Result<BoundValue> {
        Ok(BoundValue::BigInt(*self))
    }
}

impl ScalarValue for f64 {
    const KIND: ScalarKind = ScalarKind::Float64;

    fn to_bound(&self) -> Result<BoundValue> {
        Ok(BoundValue::Double(*self))
    }
}

impl ScalarValue for Timestamp {
    const KIND: ScalarKind = ScalarKind::Timestamp;

    fn to_bound(&self) -> Result<BoundValue> {
        self.decode().map(BoundValue::TimestampTz)
    }
}

/// A typed, nullable filter condition on one column.
///
/// `values[0]` is the single operand of the scalar query types; `Between`
/// reads `[low, high]`; `In` and the array operators use the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion<V> {
    /// An invalid criterion is a no-op.
    #[serde(default)]
    pub valid: bool,
    #[serde(rename = "type", default)]
    pub query_type: QueryType,
    #[serde(default)]
    pub negation: bool,
    /// Selects ILIKE over LIKE for the pattern query types.
    #[serde(default)]
    pub insensitive: bool,
    #[serde(default = "Vec::new")]
    pub values: Vec<V>,
}

pub type StringCriterion = Criterion<String>;
pub type Int64Criterion = Criterion<i64>;
pub type Float64Criterion = Criterion<f64>;
pub type TimestampCriterion = Criterion<Timestamp>;

impl<V> Criterion<V> {
    /// Creates a valid criterion.
    pub fn new(query_type: QueryType, values: Vec<V>) -> Self {
        Self {
            valid: true,
            query_type,
            negation: false,
            insensitive: false,
            values,
        }
    }

    pub fn null() -> Self {
        Self::new(QueryType::Null, Vec::new())
    }

    pub fn equal(value: V) -> Self {
        Self::new(QueryType::Equal, vec![value])
    }

    pub fn greater(value: V) -> Self {
        Self::new(QueryType::Greater, vec![value])
    }

    pub fn greater_equal(value: V) -> Self {
        Self::new(QueryType::GreaterEqual, vec![value])
    }

    pub fn less(value: V) -> Self {
        Self::new(QueryType::Less, vec![value])
    }

    pub fn less_equal(value: V) -> Self {
        Self::new(QueryType::LessEqual, vec![value])
    }

    /// Exclusive range `low < x < high`.
    pub fn between(low: V, high: V) -> Self {
        Self::new(QueryType::Between, vec![low, high])
    }

    /// IN list. An empty list places no constraint.
    pub fn one_of(values: Vec<V>) -> Self {
        Self::new(QueryType::In, values)
    }

    pub fn contains(values: Vec<V>) -> Self {
        Self::new(QueryType::Contains, values)
    }

    pub fn is_contained_by(values: Vec<V>) -> Self {
        Self::new(QueryType::IsContainedBy, values)
    }

    pub fn overlap(values: Vec<V>) -> Self {
        Self::new(QueryType::Overlap, values)
    }

    pub fn has_any_element(values: Vec<V>) -> Self {
        Self::new(QueryType::HasAnyElement, values)
    }

    pub fn has_all_elements(values: Vec<V>) -> Self {
        Self::new(QueryType::HasAllElements, values)
    }

    pub fn has_element(value: V) -> Self {
        Self::new(QueryType::HasElement, vec![value])
    }

    pub fn negated(mut self) -> Self {
        self.negation = true;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.insensitive = true;
        self
    }

    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Returns the single operand, if any.
    pub fn value(&self) -> Option<&V> {
        self.values.first()
    }
}

impl StringCriterion {
    pub fn substring(value: impl Into<String>) -> Self {
        Self::new(QueryType::Substring, vec![value.into()])
    }

    pub fn has_prefix(value: impl Into<String>) -> Self {
        Self::new(QueryType::HasPrefix, vec![value.into()])
    }

    pub fn has_suffix(value: impl Into<String>) -> Self {
        Self::new(QueryType::HasSuffix, vec![value.into()])
    }
}

/// A criterion of any scalar kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "criterion", rename_all = "snake_case")]
pub enum AnyCriterion {
    String(StringCriterion),
    Int64(Int64Criterion),
    Float64(Float64Criterion),
    Timestamp(TimestampCriterion),
}

impl AnyCriterion {
    pub fn kind(&self) -> ScalarKind {
        match self {
            AnyCriterion::String(_) => ScalarKind::String,
            AnyCriterion::Int64(_) => ScalarKind::Int64,
            AnyCriterion::Float64(_) => ScalarKind::Float64,
            AnyCriterion::Timestamp(_) => ScalarKind::Timestamp,
        }
    }

    pub fn query_type(&self) -> QueryType {
        match self {
            AnyCriterion::String(c) => c.query_type,
            AnyCriterion::Int64(c) => c.query_type,
            AnyCriterion::Float64(c) => c.query_type,
            AnyCriterion::Timestamp(c) => c.query_type,
        }
    }
}

impl From<StringCriterion> for AnyCriterion {
    fn from(c: StringCriterion) -> Self {
        AnyCriterion::String(c)
    }
}

impl From<Int64Criterion> for AnyCriterion {
    fn from(c: Int64Criterion) -> Self {
        AnyCriterion::Int64(c)
    }
}

impl From<Float64Criterion> for AnyCriterion {
    fn from(c: Float64Criterion) -> Self {
        AnyCriterion::Float64(c)
    }
}

impl From<TimestampCriterion> for AnyCriterion {
    fn from(c: TimestampCriterion) -> Self {
        AnyCriterion::Timestamp(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_operator_negation_pairs() {
        assert_eq!(QueryType::Equal.operator(false, false), " = ");
        assert_eq!(QueryType::Equal.operator(true, false), " <> ");
        assert_eq!(QueryType::Greater.operator(true, false), " <= ");
        assert_eq!(QueryType::GreaterEqual.operator(true, false), " < ");
        assert_eq!(QueryType::Less.operator(true, false), " >= ");
        assert_eq!(QueryType::LessEqual.operator(true, false), " > ");
        assert_eq!(QueryType::In.operator(true, false), " NOT IN (");
        assert_eq!(QueryType::Null.operator(true, false), " IS NOT NULL");
    }

    #[test]
    fn test_pattern_operators() {
        assert_eq!(QueryType::Substring.operator(false, false), " LIKE ");
        assert_eq!(QueryType::HasPrefix.operator(false, true), " ILIKE ");
        assert_eq!(QueryType::HasSuffix.operator(true, false), " NOT LIKE ");
        assert_eq!(QueryType::Substring.operator(true, true), " NOT ILIKE ");
    }

    #[test]
    fn test_set_operators_ignore_negation() {
        for qt in [
            QueryType::Contains,
            QueryType::IsContainedBy,
            QueryType::Overlap,
            QueryType::HasAnyElement,
            QueryType::HasAllElements,
            QueryType::HasElement,
        ] {
            assert!(qt.is_set_operator());
            assert_eq!(qt.operator(true, false), qt.operator(false, false));
        }
        assert!(!QueryType::HasElement.is_array_operator());
        assert!(QueryType::Overlap.is_array_operator());
    }

    #[test]
    fn test_capability_matrix() {
        assert!(ScalarKind::String.supports(QueryType::HasPrefix));
        assert!(!ScalarKind::Int64.supports(QueryType::HasPrefix));
        assert!(ScalarKind::Int64.supports(QueryType::HasElement));
        assert!(ScalarKind::Float64.supports(QueryType::Overlap));
        assert!(ScalarKind::Timestamp.supports(QueryType::Between));
        assert!(!ScalarKind::Timestamp.supports(QueryType::Contains));
        assert!(!ScalarKind::Timestamp.supports(QueryType::HasElement));
        assert!(!ScalarKind::Timestamp.supports(QueryType::Substring));
    }

    #[test]
    fn test_string_patterns() {
        let v = "abc".to_string();
        assert_eq!(v.to_pattern(QueryType::Substring).unwrap(), BoundValue::from("%abc%"));
        assert_eq!(v.to_pattern(QueryType::HasPrefix).unwrap(), BoundValue::from("abc%"));
        assert_eq!(v.to_pattern(QueryType::HasSuffix).unwrap(), BoundValue::from("%abc"));
        assert!(v.to_pattern(QueryType::Equal).is_err());
        assert!(matches!(
            5i64.to_pattern(QueryType::Substring),
            Err(CriteriaError::UnsupportedQueryType(_))
        ));
    }

    #[test]
    fn test_timestamp_decode() {
        let dt = Utc.with_ymd_and_hms(2021, 6, 15, 8, 0, 0).unwrap();
        let ts = Timestamp::from(dt);
        assert_eq!(ts.decode().unwrap(), dt);
        assert_eq!(ts.to_bound().unwrap(), BoundValue::TimestampTz(dt));
    }

    #[test]
    fn test_timestamp_from_leap_second() {
        let leap = chrono::NaiveDate::from_ymd_opt(2016, 12, 31)
            .unwrap()
            .and_hms_nano_opt(23, 59, 59, 1_500_000_000)
            .unwrap()
            .and_utc();
        assert_eq!(leap.timestamp_subsec_nanos(), 1_500_000_000);

        let ts = Timestamp::from(leap);
        assert_eq!(ts.nanos, 999_999_999);
        let decoded = ts.decode().unwrap();
        assert_eq!(decoded.timestamp(), leap.timestamp());
        assert_eq!(decoded.timestamp_subsec_nanos(), 999_999_999);
    }

    #[test]
    fn test_timestamp_decode_rejects_out_of_range() {
        assert!(matches!(
            Timestamp::new(0, 1_000_000_000).decode(),
            Err(CriteriaError::ValueDecoding(_))
        ));
        assert!(matches!(
            Timestamp::new(0, -1).decode(),
            Err(CriteriaError::ValueDecoding(_))
        ));
        assert!(matches!(
            Timestamp::new(MAX_VALID_SECONDS, 0).decode(),
            Err(CriteriaError::ValueDecoding(_))
        ));
        assert!(Timestamp::new(MIN_VALID_SECONDS, 0).decode().is_ok());
    }

    #[test]
    fn test_criterion_constructors() {
        let c = Int64Criterion::between(10, 20).negated();
        assert!(c.valid);
        assert!(c.negation);
        assert_eq!(c.query_type, QueryType::Between);
        assert_eq!(c.values, vec![10, 20]);
        assert_eq!(c.value(), Some(&10));

        let c = StringCriterion::substring("abc").case_insensitive();
        assert!(c.insensitive);
        assert_eq!(c.value().map(String::as_str), Some("abc"));

        assert!(!Int64Criterion::null().invalid().valid);
    }

    #[test]
    fn test_criterion_deserialize() {
        let c: Int64Criterion =
            serde_json::from_str(r#"{"valid":true,"type":"GREATER_EQUAL","values":[18]}"#).unwrap();
        assert_eq!(c, Int64Criterion::greater_equal(18));

        // Missing fields mirror a zero-valued wrapper, which is a no-op.
        let c: StringCriterion = serde_json::from_str("{}").unwrap();
        assert!(!c.valid);
        assert_eq!(c.query_type, QueryType::Null);
    }

    #[test]
    fn test_any_criterion_serde() {
        let any = AnyCriterion::from(StringCriterion::has_prefix("jo"));
        let json = serde_json::to_value(&any).unwrap();
        assert_eq!(json["kind"], "string");
        assert_eq!(json["criterion"]["type"], "HAS_PREFIX");
        let back: AnyCriterion = serde_json::from_value(json).unwrap();
        assert_eq!(back, any);
        assert_eq!(back.kind(), ScalarKind::String);
    }
}
