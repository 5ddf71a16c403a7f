//! Decoding of engine results back into typed statistics.
//!
//! Every decoder walks the [`PackedQuery`] slot list that produced the
//! result, so cell `i` is always interpreted as slot `i`. A result whose
//! width differs from the slot count is rejected before any cell is read.
//! NULL numeric cells decode to NaN.

use std::collections::{HashMap, HashSet};

use crate::engine::ResultCursor;
use crate::error::{Result, StatsError};
use crate::query::{PackedQuery, PercentileSet, Slot, Statistic};
use crate::summary::{
    CategoricalSummary, FiveNumSummary, NumericSummary, QuantileResult, VarianceResult,
};

fn check_width(cursor: &dyn ResultCursor, query: &PackedQuery) -> Result<()> {
    if cursor.column_count() != query.width() {
        return Err(StatsError::contract_violation(format!(
            "query declared {} result columns but the engine returned {}: {}",
            query.width(),
            cursor.column_count(),
            query.query()
        )));
    }
    Ok(())
}

/// Reads the single row of an aggregate query, one value per slot.
pub fn read_single_row(cursor: &mut dyn ResultCursor, query: &PackedQuery) -> Result<Vec<f64>> {
    check_width(cursor, query)?;
    if !cursor.advance() {
        return Err(StatsError::contract_violation(format!(
            "expected one result row, got none: {}",
            query.query()
        )));
    }
    let values = (0..query.width())
        .map(|index| Ok(cursor.get_double(index)?.unwrap_or(f64::NAN)))
        .collect::<Result<Vec<f64>>>()?;
    if cursor.advance() {
        return Err(StatsError::contract_violation(format!(
            "expected one result row, got more: {}",
            query.query()
        )));
    }
    Ok(values)
}

/// Drains a distinct-values result into a deduplicated list.
///
/// NULL and empty cells are dropped.
pub fn decode_distinct(
    cursor: &mut dyn ResultCursor,
    query: &PackedQuery,
) -> Result<CategoricalSummary> {
    check_width(cursor, query)?;
    let column = match query.slots() {
        [Slot {
            column,
            statistic: Statistic::DistinctValues,
        }] => column.clone(),
        _ => return Err(layout_mismatch(query, "a single distinct-values slot")),
    };

    let mut seen = HashSet::new();
    let mut values = Vec::new();
    while cursor.advance() {
        if let Some(value) = cursor.get_string(0)? {
            if !value.is_empty() && seen.insert(value.clone()) {
                values.push(value);
            }
        }
    }
    Ok(CategoricalSummary { column, values })
}

/// Decodes `(min, max)` pairs, one summary per column in slot order.
pub fn decode_numeric_range(
    cursor: &mut dyn ResultCursor,
    query: &PackedQuery,
) -> Result<Vec<NumericSummary>> {
    let values = read_single_row(cursor, query)?;
    if query.width() % 2 != 0 {
        return Err(layout_mismatch(query, "(min, max) pairs"));
    }

    query
        .slots()
        .chunks_exact(2)
        .zip(values.chunks_exact(2))
        .map(|(slots, cells)| match slots {
            [min_slot, max_slot]
                if min_slot.statistic == Statistic::Min
                    && max_slot.statistic == Statistic::Max
                    && min_slot.column == max_slot.column =>
            {
                Ok(NumericSummary {
                    column: min_slot.column.clone(),
                    min: cells[0],
                    max: cells[1],
                })
            }
            _ => Err(layout_mismatch(query, "(min, max) pairs")),
        })
        .collect()
}

/// Decodes five-number groups and lines them up with the requested names.
///
/// `query` is `None` when no requested column was numeric. Names without a
/// slot group resolve to the all-NaN summary without consuming any cell.
pub fn decode_five_number(
    cursor: Option<&mut dyn ResultCursor>,
    query: Option<&PackedQuery>,
    requested: &[String],
) -> Result<Vec<FiveNumSummary>> {
    let mut decoded: HashMap<&str, [f64; 5]> = HashMap::new();

    if let (Some(cursor), Some(query)) = (cursor, query) {
        let values = read_single_row(cursor, query)?;
        if query.width() % 5 != 0 {
            return Err(layout_mismatch(query, "groups of five order statistics"));
        }
        for (slots, cells) in query.slots().chunks_exact(5).zip(values.chunks_exact(5)) {
            let column = slots[0].column.as_str();
            if slots.iter().any(|slot| slot.column != column) {
                return Err(layout_mismatch(query, "groups of five order statistics"));
            }
            let mut group = [f64::NAN; 5];
            group.copy_from_slice(cells);
            decoded.insert(column, group);
        }
    }

    Ok(requested
        .iter()
        .map(|name| match decoded.get(name.as_str()) {
            Some(values) => FiveNumSummary::new(name.clone(), *values),
            None => FiveNumSummary::undefined(name.clone()),
        })
        .collect())
}

/// Decodes quantile slots back into ascending-percentile order.
pub fn decode_quantiles(
    cursor: &mut dyn ResultCursor,
    query: &PackedQuery,
    percentiles: &PercentileSet,
) -> Result<QuantileResult> {
    let values = read_single_row(cursor, query)?;

    let mut by_percentile = HashMap::with_capacity(values.len());
    for (slot, value) in query.slots().iter().zip(values) {
        let percentile = match slot.statistic {
            Statistic::Percentile { percentile, .. } => percentile,
            Statistic::Min => 0.0,
            Statistic::Max => 1.0,
            _ => return Err(layout_mismatch(query, "percentile, min, or max slots")),
        };
        by_percentile.insert(percentile.to_bits(), value);
    }

    let ordered = percentiles
        .percentiles()
        .iter()
        .map(|p| {
            by_percentile
                .get(&p.to_bits())
                .copied()
                .ok_or_else(|| layout_mismatch(query, "one slot per requested percentile"))
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(QuantileResult {
        column: query
            .slots()
            .first()
            .map(|slot| slot.column.clone())
            .unwrap_or_default(),
        percentiles: percentiles.percentiles().to_vec(),
        values: ordered,
    })
}

/// Decodes a one-slot aggregate.
pub fn decode_scalar(cursor: &mut dyn ResultCursor, query: &PackedQuery) -> Result<f64> {
    let values = read_single_row(cursor, query)?;
    match values.as_slice() {
        [value] => Ok(*value),
        _ => Err(layout_mismatch(query, "a single slot")),
    }
}

/// Decodes a sample-variance aggregate.
pub fn decode_variance(cursor: &mut dyn ResultCursor, query: &PackedQuery) -> Result<VarianceResult> {
    decode_scalar(cursor, query).map(VarianceResult::from_variance)
}

fn layout_mismatch(query: &PackedQuery, expected: &str) -> StatsError {
    StatsError::contract_violation(format!(
        "slot layout of '{}' is not {expected}",
        query.query()
    ))
}
