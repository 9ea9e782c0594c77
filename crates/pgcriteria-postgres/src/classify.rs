//! Column classification.
//!
//! Decides which criterion kind filters a column, from the column's declared
//! type and the mode the column is rendered in. Only criteria mode produces
//! a scalar kind.

use serde::{Deserialize, Serialize};

use crate::criterion::ScalarKind;

/// Rendering mode of a column property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Default,
    Mandatory,
    Optional,
    /// The column is used as a filter
    Criteria,
}

/// Language-side scalar type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinType {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
}

/// Declared type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Builtin(BuiltinType),
    /// SQL type name as declared, e.g. `BIGINT`, `VARCHAR(255)`, `TEXT[]`
    Base(String),
    /// A custom type whose criterion is already one of the scalar kinds
    Custom(ScalarKind),
    /// Alternative representations; the first one that classifies wins
    Mappable(Vec<ColumnType>),
}

/// Outcome of classifying a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Scalar(ScalarKind),
    /// No criterion applies; no compiler must be invoked for the column
    Unsupported,
}

impl Classification {
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            Classification::Scalar(kind) => Some(*kind),
            Classification::Unsupported => None,
        }
    }
}

/// Kinds in the order they are tried.
const KIND_ORDER: [ScalarKind; 4] = [
    ScalarKind::String,
    ScalarKind::Int64,
    ScalarKind::Float64,
    ScalarKind::Timestamp,
];

/// Classifies a column type in the given mode.
pub fn classify(declared: &ColumnType, mode: Mode) -> Classification {
    if mode != Mode::Criteria {
        return Classification::Unsupported;
    }
    KIND_ORDER
        .into_iter()
        .find(|kind| matches_kind(declared, *kind))
        .map_or(Classification::Unsupported, Classification::Scalar)
}

fn matches_kind(declared: &ColumnType, kind: ScalarKind) -> bool {
    match declared {
        ColumnType::Builtin(builtin) => builtin_kind(*builtin) == Some(kind),
        ColumnType::Base(name) => base_kind(name) == Some(kind),
        ColumnType::Custom(custom) => *custom == kind,
        ColumnType::Mappable(mapping) => mapping.iter().any(|m| matches_kind(m, kind)),
    }
}

fn builtin_kind(builtin: BuiltinType) -> Option<ScalarKind> {
    match builtin {
        BuiltinType::Int
        | BuiltinType::Int8
        | BuiltinType::Int16
        | BuiltinType::Int32
        | BuiltinType::Int64 => Some(ScalarKind::Int64),
        BuiltinType::Float32 | BuiltinType::Float64 => Some(ScalarKind::Float64),
        BuiltinType::String => Some(ScalarKind::String),
        BuiltinType::Bool => None,
    }
}

fn base_kind(name: &str) -> Option<ScalarKind> {
    let name = name.trim().to_ascii_uppercase();
    let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| name.starts_with(p));

    match name.as_str() {
        "SMALLINT" | "INTEGER" | "BIGINT" | "SMALLSERIAL" | "SERIAL" | "BIGSERIAL" => {
            return Some(ScalarKind::Int64)
        }
        "DOUBLE PRECISION" => return Some(ScalarKind::Float64),
        "TEXT" | "UUID" => return Some(ScalarKind::String),
        "TIMESTAMP" | "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => {
            return Some(ScalarKind::Timestamp)
        }
        _ => {}
    }

    if has_prefix(&["INTEGER[", "BIGINT[", "SMALLINT["]) {
        Some(ScalarKind::Int64)
    } else if has_prefix(&["DECIMAL", "NUMERIC", "DOUBLE PRECISION["]) {
        Some(ScalarKind::Float64)
    } else if has_prefix(&["TEXT[", "VARCHAR", "CHARACTER["]) {
        Some(ScalarKind::String)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(name: &str) -> ColumnType {
        ColumnType::Base(name.to_string())
    }

    fn kind_of(declared: &ColumnType) -> Option<ScalarKind> {
        classify(declared, Mode::Criteria).kind()
    }

    #[test]
    fn test_integer_types() {
        for name in ["SMALLINT", "INTEGER", "BIGINT", "SERIAL", "BIGSERIAL", "SMALLSERIAL", "INTEGER[]", "BIGINT[3]"] {
            assert_eq!(kind_of(&base(name)), Some(ScalarKind::Int64), "{}", name);
        }
        assert_eq!(kind_of(&ColumnType::Builtin(BuiltinType::Int16)), Some(ScalarKind::Int64));
    }

    #[test]
    fn test_float_types() {
        for name in ["DOUBLE PRECISION", "DECIMAL", "NUMERIC(10,2)", "DOUBLE PRECISION[]"] {
            assert_eq!(kind_of(&base(name)), Some(ScalarKind::Float64), "{}", name);
        }
        assert_eq!(kind_of(&ColumnType::Builtin(BuiltinType::Float32)), Some(ScalarKind::Float64));
    }

    #[test]
    fn test_string_types() {
        for name in ["TEXT", "UUID", "TEXT[]", "VARCHAR", "varchar(255)", "CHARACTER[]"] {
            assert_eq!(kind_of(&base(name)), Some(ScalarKind::String), "{}", name);
        }
        assert_eq!(kind_of(&ColumnType::Builtin(BuiltinType::String)), Some(ScalarKind::String));
    }

    #[test]
    fn test_timestamp_types() {
        assert_eq!(kind_of(&base("TIMESTAMP")), Some(ScalarKind::Timestamp));
        assert_eq!(kind_of(&base("timestamptz")), Some(ScalarKind::Timestamp));
    }

    #[test]
    fn test_unsupported_types() {
        assert_eq!(classify(&base("BOOLEAN"), Mode::Criteria), Classification::Unsupported);
        assert_eq!(classify(&base("JSONB"), Mode::Criteria), Classification::Unsupported);
        assert_eq!(
            classify(&ColumnType::Builtin(BuiltinType::Bool), Mode::Criteria),
            Classification::Unsupported
        );
    }

    #[test]
    fn test_non_criteria_mode_is_unsupported() {
        for mode in [Mode::Default, Mode::Mandatory, Mode::Optional] {
            assert_eq!(classify(&base("BIGINT"), mode), Classification::Unsupported);
        }
    }

    #[test]
    fn test_custom_and_mappable() {
        assert_eq!(kind_of(&ColumnType::Custom(ScalarKind::Timestamp)), Some(ScalarKind::Timestamp));

        let mapped = ColumnType::Mappable(vec![base("JSONB"), base("BIGINT")]);
        assert_eq!(kind_of(&mapped), Some(ScalarKind::Int64));

        // String is tried before Int64 regardless of mapping order.
        let mapped = ColumnType::Mappable(vec![base("BIGINT"), base("TEXT")]);
        assert_eq!(kind_of(&mapped), Some(ScalarKind::String));

        let mapped = ColumnType::Mappable(vec![base("JSONB")]);
        assert_eq!(kind_of(&mapped), None);
    }
}
