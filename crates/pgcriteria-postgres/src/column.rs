//! Per-column WHERE clause dispatch.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::classify::{classify, Classification, ColumnType, Mode};
use crate::composer::FragmentBuilder;
use crate::criterion::AnyCriterion;
use crate::options::CompositionOptions;
use crate::{CriteriaError, Result};

/// A filterable column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Table alias id qualifying the selector; `None` leaves it unqualified
    pub id: Option<u32>,
    /// Column name, or the full expression of a dynamic column
    pub selector: String,
    pub declared: ColumnType,
    /// Computed column whose selector is already an expression
    #[serde(default)]
    pub is_dynamic: bool,
}

impl Column {
    pub fn new(selector: &str, declared: ColumnType) -> Self {
        Self {
            id: None,
            selector: selector.to_string(),
            declared,
            is_dynamic: false,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }

    /// The composition options used for this column's clause.
    pub fn options(&self) -> CompositionOptions {
        if self.is_dynamic {
            CompositionOptions::dynamic_and()
        } else {
            CompositionOptions::and()
        }
    }
}

/// Appends the clause filtering `column` by `criterion`.
///
/// Missing criteria and columns no criterion kind applies to are skipped.
///
/// # Errors
///
/// Returns `KindMismatch` when the criterion kind differs from the column's,
/// and any error of the compiler itself.
#[instrument(level = "trace", skip_all, fields(selector = %column.selector))]
pub fn where_clause<W: Write>(
    column: &Column,
    criterion: Option<&AnyCriterion>,
    builder: &mut FragmentBuilder<W>,
) -> Result<()> {
    let Some(criterion) = criterion else {
        return Ok(());
    };

    let kind = match classify(&column.declared, Mode::Criteria) {
        Classification::Scalar(kind) => kind,
        Classification::Unsupported => {
            trace!(declared = ?column.declared, "no criterion kind for column");
            return Ok(());
        }
    };

    if criterion.kind() != kind {
        return Err(CriteriaError::KindMismatch(format!(
            "{} criterion on {} column '{}'",
            criterion.kind(),
            kind,
            column.selector
        )));
    }

    criterion.compile(column.id, &column.selector, builder, &column.options())
}
