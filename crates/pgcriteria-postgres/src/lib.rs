//! Typed query criteria compiled into parameterized PostgreSQL predicates.
//!
//! A criterion describes one filter on one column: a query type (equality,
//! comparison, range, pattern, set membership, array containment), a
//! negation flag, a case-insensitivity flag and a list of typed values. The
//! compiler appends the matching predicate text to a [`FragmentBuilder`] and
//! records every value as a bound parameter, so no value is ever
//! interpolated into the SQL.
//!
//! # Architecture
//!
//! ```text
//! Column + AnyCriterion
//!           |
//!      classify / where_clause   (column.rs, classify.rs)
//!           |
//!      compile<V: ScalarValue>   (compiler/)
//!           |
//!   FragmentBuilder  ->  (sql, Vec<BoundValue>)  ->  PgArguments
//! ```
//!
//! # Key Features
//!
//! - **One compiler for every kind**: string, 64-bit integer, 64-bit float and
//!   timestamp criteria share a single routine driven by [`ScalarValue`]
//! - **Composition**: clauses accumulate with a configurable joint, so several
//!   columns compose into one WHERE fragment with sequential placeholders
//! - **Selector shaping**: table aliases, casts, wrapping functions and
//!   dynamic (expression) columns
//! - **Array operators**: `@>`, `<@`, `&&`, `?|`, `?&` and `?`, with operands
//!   encoded as native arrays or JSON arrays for JSONB columns
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use pgcriteria_postgres::{where_clause, Column, ColumnType, FragmentBuilder, Int64Criterion};
//!
//! let mut builder = FragmentBuilder::new();
//! let age = Column::new("age", ColumnType::Base("BIGINT".into())).with_id(0);
//! where_clause(&age, Some(&Int64Criterion::between(18, 65).into()), &mut builder)?;
//!
//! let (sql, params) = builder.build();
//! // sql: "t0.age > $1 AND t0.age < $2"
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`CriteriaError`]. After an error the
//! builder must be discarded.
//!
//! # Thread Safety
//!
//! Criteria and options are plain data and can be shared freely. A
//! `FragmentBuilder` is used by one caller at a time.

/// Bound parameter values and their PostgreSQL binding.
pub mod types;

/// Criterion data model: query types, scalar kinds and typed criteria.
pub mod criterion;

/// Composition options controlling joints, casts and wrapping functions.
pub mod options;

/// Fragment builder accumulating SQL text and bound parameters.
pub mod composer;

/// Array operand encoding (native or JSON).
pub mod encoder;

/// The criterion compiler.
pub mod compiler;

/// Column type classification.
pub mod classify;

/// Per-column WHERE clause dispatch.
pub mod column;

pub use types::BoundValue;
pub use criterion::{
    AnyCriterion, Criterion, Float64Criterion, Int64Criterion, QueryType, ScalarKind,
    ScalarValue, StringCriterion, Timestamp, TimestampCriterion,
};
pub use options::CompositionOptions;
pub use composer::{BuilderConfig, FragmentBuilder};
pub use encoder::{encode, encode_values};
pub use compiler::{compile, compile_float64, compile_int64, compile_string, compile_timestamp};
pub use classify::{classify, BuiltinType, Classification, ColumnType, Mode};
pub use column::{where_clause, Column};

pub use pgcriteria_common::{CriteriaError, Result};
