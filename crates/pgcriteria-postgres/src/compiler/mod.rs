//! Criterion compiler.
//!
//! Turns one typed criterion into a predicate fragment appended to a
//! [`FragmentBuilder`]. A single generic routine serves every scalar kind;
//! the kind's [`ScalarValue`] implementation decides which query types it
//! supports and how its values are bound.
//!
//! # Example
//!
//! ```ignore
//! use pgcriteria_postgres::{compile, CompositionOptions, FragmentBuilder, Int64Criterion};
//!
//! let mut builder = FragmentBuilder::new();
//! compile(&Int64Criterion::between(10, 20), None, "price", &mut builder, &CompositionOptions::and())?;
//! compile(&Int64Criterion::one_of(vec![1, 2]), None, "age", &mut builder, &CompositionOptions::and())?;
//!
//! let (sql, params) = builder.build();
//! // Result: "price > $1 AND price < $2 AND age IN ($3,$4)"
//! ```

use std::fmt::Write;

use tracing::{debug, trace};

use crate::composer::FragmentBuilder;
use crate::criterion::{
    AnyCriterion, Criterion, Float64Criterion, Int64Criterion, QueryType, ScalarValue,
    StringCriterion, TimestampCriterion,
};
use crate::encoder;
use crate::options::CompositionOptions;
use crate::types::BoundValue;
use crate::{CriteriaError, Result};


/// Joint between the two halves of a decomposed BETWEEN.
const BETWEEN_JOINT: &str = " AND ";

/// Operand of a clause, fully converted before anything is written.
enum Operand {
    None,
    Single(BoundValue),
    List(Vec<BoundValue>),
}

/// Compiles `criterion` on `selector` into `builder`.
///
/// Invalid criteria and empty IN lists are no-ops. On error the builder
/// must be discarded; only a write failure can leave partial text behind.
///
/// # Arguments
///
/// * `column_id` - Table alias id qualifying the selector, if any
/// * `selector` - Column name, or a full expression when `options.is_dynamic`
pub fn compile<V, W>(
    criterion: &Criterion<V>,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
) -> Result<()>
where
    V: ScalarValue,
    W: Write,
{
    compile_clause(criterion, column_id, selector, builder, options, &options.joint)
}

pub fn compile_string<W: Write>(
    criterion: &StringCriterion,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
) -> Result<()> {
    compile(criterion, column_id, selector, builder, options)
}

pub fn compile_int64<W: Write>(
    criterion: &Int64Criterion,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
) -> Result<()> {
    compile(criterion, column_id, selector, builder, options)
}

pub fn compile_float64<W: Write>(
    criterion: &Float64Criterion,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
) -> Result<()> {
    compile(criterion, column_id, selector, builder, options)
}

pub fn compile_timestamp<W: Write>(
    criterion: &TimestampCriterion,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
) -> Result<()> {
    compile(criterion, column_id, selector, builder, options)
}

impl AnyCriterion {
    /// Compiles the criterion with the routine matching its kind.
    pub fn compile<W: Write>(
        &self,
        column_id: Option<u32>,
        selector: &str,
        builder: &mut FragmentBuilder<W>,
        options: &CompositionOptions,
    ) -> Result<()> {
        match self {
            AnyCriterion::String(c) => compile(c, column_id, selector, builder, options),
            AnyCriterion::Int64(c) => compile(c, column_id, selector, builder, options),
            AnyCriterion::Float64(c) => compile(c, column_id, selector, builder, options),
            AnyCriterion::Timestamp(c) => compile(c, column_id, selector, builder, options),
        }
    }
}

fn compile_clause<V, W>(
    criterion: &Criterion<V>,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
    joint: &str,
) -> Result<()>
where
    V: ScalarValue,
    W: Write,
{
    if !criterion.valid {
        trace!(selector, "skipping invalid criterion");
        return Ok(());
    }

    let query_type = criterion.query_type;
    if !V::KIND.supports(query_type) {
        return Err(CriteriaError::UnsupportedQueryType(format!(
            "{} on {} column '{}'",
            query_type,
            V::KIND,
            selector
        )));
    }

    match query_type {
        QueryType::In if criterion.values.is_empty() => {
            trace!(selector, "skipping IN criterion without values");
            return Ok(());
        }
        QueryType::Between => {
            return compile_between(criterion, column_id, selector, builder, options, joint);
        }
        _ => {}
    }

    let operand = prepare_operand(criterion, options)?;
    let bound_before = builder.params().len();

    write_selector(criterion, column_id, selector, builder, options, joint)?;
    builder.write_text(query_type.operator(criterion.negation, criterion.insensitive))?;

    match operand {
        Operand::None => {}
        Operand::Single(value) => {
            write_placeholder(builder, options)?;
            builder.add_param(value);
        }
        Operand::List(values) => {
            for (i, value) in values.into_iter().enumerate() {
                if i != 0 {
                    builder.write_text(",")?;
                }
                write_placeholder(builder, options)?;
                builder.add_param(value);
                builder.set_dirty(true);
            }
            builder.write_text(")")?;
        }
    }
    builder.set_dirty(true);

    debug!(
        selector,
        query_type = %query_type,
        negation = criterion.negation,
        params = builder.params().len() - bound_before,
        "compiled criterion"
    );
    Ok(())
}

/// Rewrites `low < x < high` into a GREATER and a LESS clause.
///
/// Negation is pushed into each half, so a negated range renders as
/// `x <= low AND x >= high`.
fn compile_between<V, W>(
    criterion: &Criterion<V>,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
    joint: &str,
) -> Result<()>
where
    V: ScalarValue,
    W: Write,
{
    let [low, high] = criterion.values.as_slice() else {
        return Err(CriteriaError::MalformedCriterion(format!(
            "BETWEEN on '{}' expects 2 values, got {}",
            selector,
            criterion.values.len()
        )));
    };
    // Both bounds must convert before the low half is written.
    low.to_bound()?;
    high.to_bound()?;

    let half = |query_type: QueryType, value: &V| Criterion {
        valid: true,
        query_type,
        negation: criterion.negation,
        insensitive: criterion.insensitive,
        values: vec![value.clone()],
    };

    compile_clause(&half(QueryType::Greater, low), column_id, selector, builder, options, joint)?;
    compile_clause(&half(QueryType::Less, high), column_id, selector, builder, options, BETWEEN_JOINT)
}

fn prepare_operand<V: ScalarValue>(
    criterion: &Criterion<V>,
    options: &CompositionOptions,
) -> Result<Operand> {
    let query_type = criterion.query_type;
    Ok(match query_type {
        QueryType::Null => Operand::None,
        QueryType::In => Operand::List(
            criterion
                .values
                .iter()
                .map(ScalarValue::to_bound)
                .collect::<Result<Vec<_>>>()?,
        ),
        qt if qt.is_array_operator() => {
            Operand::Single(encoder::encode_values(&criterion.values, options.is_json)?)
        }
        qt if qt.is_pattern() => Operand::Single(single_value(criterion)?.to_pattern(qt)?),
        _ => Operand::Single(single_value(criterion)?.to_bound()?),
    })
}

fn single_value<V>(criterion: &Criterion<V>) -> Result<&V> {
    criterion.value().ok_or_else(|| {
        CriteriaError::MalformedCriterion(format!("{} requires a value", criterion.query_type))
    })
}

/// Writes joint, negation prefix, selector functions, alias, selector and cast.
fn write_selector<V, W: Write>(
    criterion: &Criterion<V>,
    column_id: Option<u32>,
    selector: &str,
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
    joint: &str,
) -> Result<()> {
    if builder.is_dirty() {
        builder.write_text(joint)?;
    }
    if criterion.negation && criterion.query_type.is_set_operator() {
        builder.write_text("NOT ")?;
    }

    for func in &options.selector_funcs {
        builder.write_text(func)?;
        builder.write_text("(")?;
    }

    let cast = options.cast();
    if cast.is_some() {
        builder.write_text("(")?;
    }
    if !options.is_dynamic {
        builder.write_alias(column_id)?;
    }
    builder.write_text(selector)?;
    if let Some(cast) = cast {
        builder.write_text(")::")?;
        builder.write_text(cast)?;
    }

    for _ in &options.selector_funcs {
        builder.write_text(")")?;
    }
    Ok(())
}

fn write_placeholder<W: Write>(
    builder: &mut FragmentBuilder<W>,
    options: &CompositionOptions,
) -> Result<()> {
    for func in &options.placeholder_funcs {
        builder.write_text(func)?;
        builder.write_text("(")?;
    }
    builder.write_placeholder()?;
    for _ in &options.placeholder_funcs {
        builder.write_text(")")?;
    }
    Ok(())
}
