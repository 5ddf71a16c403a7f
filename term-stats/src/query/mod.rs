//! Compilation of statistic requests into packed aggregate queries.
//!
//! A [`PackedQuery`] pairs the query text with the ordered list of
//! [`Slot`]s it produces. Slot `i` is result cell `i`; the decoder reads
//! cells by walking the same slot list, so the layout is never implied.
//!
//! Layouts:
//!
//! - numeric range: `min(c0), max(c0), min(c1), max(c1), ...`
//! - five-number: `min, p25, p50, p75, max` per numeric column
//! - quantiles: one percentile slot per interior cut point (ascending),
//!   then `min` if 0.0 was requested, then `max` if 1.0 was requested
//! - scalar: a single slot

pub mod dialect;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::schema::{Column, Dataset};
use crate::security::{InputValidator, SqlSecurity};

pub use self::dialect::{DataFusionDialect, Dialect, HiveDialect};

/// How a percentile is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PercentileMethod {
    /// Exact order statistic; used for integral columns.
    Exact,
    /// Approximate (sketch based); used for fractional columns.
    Approximate,
}

impl PercentileMethod {
    /// Picks the method for a numeric column.
    pub fn for_column(column: &Column) -> Self {
        if column.is_integral() {
            PercentileMethod::Exact
        } else {
            PercentileMethod::Approximate
        }
    }
}

/// A statistic occupying one result cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statistic {
    /// The column value itself; one row per distinct non-null value.
    DistinctValues,
    Min,
    Max,
    Mean,
    /// Sample variance
    Variance,
    /// Sample covariance with another column
    Covariance { with: String },
    /// Pearson correlation with another column
    Correlation { with: String },
    Percentile {
        percentile: f64,
        method: PercentileMethod,
    },
}

/// One result cell of a packed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub column: String,
    pub statistic: Statistic,
}

impl Slot {
    pub fn new(column: impl Into<String>, statistic: Statistic) -> Self {
        Self {
            column: column.into(),
            statistic,
        }
    }
}

/// Query text plus the slot layout of its single result row.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedQuery {
    query: String,
    slots: Vec<Slot>,
}

impl PackedQuery {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of result cells the engine must return per row.
    pub fn width(&self) -> usize {
        self.slots.len()
    }
}

/// Deduplicated, ascending percentile cut points.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileSet {
    percentiles: Vec<f64>,
}

impl PercentileSet {
    /// Validates and normalizes requested percentiles.
    ///
    /// Fails on an empty request or any value outside `[0, 1]`.
    pub fn new(requested: &[f64]) -> Result<Self> {
        if requested.is_empty() {
            return Err(StatsError::invalid_argument(
                "at least one percentile is required",
            ));
        }
        let mut percentiles = Vec::with_capacity(requested.len());
        for &percentile in requested {
            InputValidator::validate_percentile(percentile)?;
            // folds -0.0 into 0.0
            percentiles.push(if percentile == 0.0 { 0.0 } else { percentile });
        }
        percentiles.sort_by(f64::total_cmp);
        percentiles.dedup();
        Ok(Self { percentiles })
    }

    /// All cut points, ascending.
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn has_zero(&self) -> bool {
        self.percentiles.first() == Some(&0.0)
    }

    pub fn has_one(&self) -> bool {
        self.percentiles.last() == Some(&1.0)
    }

    /// Cut points strictly between 0 and 1; these need a percentile function.
    pub fn interior(&self) -> impl Iterator<Item = f64> + '_ {
        self.percentiles
            .iter()
            .copied()
            .filter(|&p| p > 0.0 && p < 1.0)
    }
}

/// Builds packed queries against one dataset in one dialect.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    dataset: &'a Dataset,
    dialect: &'a dyn Dialect,
    quote_identifiers: bool,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(dataset: &'a Dataset, dialect: &'a dyn Dialect) -> Self {
        Self {
            dataset,
            dialect,
            quote_identifiers: true,
        }
    }

    /// Whether names are quoted before interpolation (default: true).
    ///
    /// Unquoted names must match the strict identifier grammar.
    pub fn quote_identifiers(mut self, quote: bool) -> Self {
        self.quote_identifiers = quote;
        self
    }

    /// `SELECT DISTINCT c FROM t WHERE c IS NOT NULL`
    pub fn distinct_values(&self, column: &Column) -> Result<PackedQuery> {
        let name = self.identifier(column.name())?;
        let query = format!(
            "SELECT DISTINCT {name} FROM {} WHERE {name} IS NOT NULL",
            self.table()?
        );
        Ok(PackedQuery {
            query,
            slots: vec![Slot::new(column.name(), Statistic::DistinctValues)],
        })
    }

    /// Min and max of every column in one row, two contiguous slots per column.
    pub fn numeric_range(&self, columns: &[Column]) -> Result<PackedQuery> {
        if columns.is_empty() {
            return Err(StatsError::invalid_argument(
                "numeric range needs at least one column",
            ));
        }
        let slots = columns
            .iter()
            .flat_map(|column| {
                [
                    Slot::new(column.name(), Statistic::Min),
                    Slot::new(column.name(), Statistic::Max),
                ]
            })
            .collect();
        self.aggregate(slots)
    }

    /// Five order statistics per column, packed in the given order.
    ///
    /// Repeated columns are only queried once.
    pub fn five_number(&self, columns: &[&Column]) -> Result<PackedQuery> {
        if columns.is_empty() {
            return Err(StatsError::invalid_argument(
                "five-number summary needs at least one numeric column",
            ));
        }
        let mut slots: Vec<Slot> = Vec::with_capacity(columns.len() * 5);
        for column in columns {
            Self::require_numeric(column)?;
            if slots.iter().any(|slot| slot.column == column.name()) {
                continue;
            }
            let method = PercentileMethod::for_column(column);
            slots.push(Slot::new(column.name(), Statistic::Min));
            for percentile in [0.25, 0.5, 0.75] {
                slots.push(Slot::new(
                    column.name(),
                    Statistic::Percentile { percentile, method },
                ));
            }
            slots.push(Slot::new(column.name(), Statistic::Max));
        }
        self.aggregate(slots)
    }

    /// Quantiles of one numeric column.
    ///
    /// 0.0 and 1.0 are answered by `min`/`max` slots placed after the
    /// percentile slots, so a request of only `{0, 1}` never calls a
    /// percentile function.
    pub fn quantiles(&self, column: &Column, percentiles: &PercentileSet) -> Result<PackedQuery> {
        Self::require_numeric(column)?;
        let method = PercentileMethod::for_column(column);

        let mut slots: Vec<Slot> = percentiles
            .interior()
            .map(|percentile| {
                Slot::new(column.name(), Statistic::Percentile { percentile, method })
            })
            .collect();
        if percentiles.has_zero() {
            slots.push(Slot::new(column.name(), Statistic::Min));
        }
        if percentiles.has_one() {
            slots.push(Slot::new(column.name(), Statistic::Max));
        }
        self.aggregate(slots)
    }

    /// A single-slot, single-row query.
    pub fn scalar(&self, column: &Column, statistic: Statistic) -> Result<PackedQuery> {
        if statistic == Statistic::DistinctValues {
            return Err(StatsError::invalid_argument(
                "distinct values are not a scalar statistic",
            ));
        }
        self.aggregate(vec![Slot::new(column.name(), statistic)])
    }

    fn aggregate(&self, slots: Vec<Slot>) -> Result<PackedQuery> {
        let expressions = slots
            .iter()
            .map(|slot| self.expression(slot))
            .collect::<Result<Vec<_>>>()?;
        let query = format!("SELECT {} FROM {}", expressions.join(", "), self.table()?);
        debug!(
            dialect = self.dialect.name(),
            slots = slots.len(),
            "Built packed query"
        );
        Ok(PackedQuery { query, slots })
    }

    fn expression(&self, slot: &Slot) -> Result<String> {
        let column = self.identifier(&slot.column)?;
        let dialect = self.dialect;
        Ok(match &slot.statistic {
            Statistic::DistinctValues => column,
            Statistic::Min => dialect.min(&column),
            Statistic::Max => dialect.max(&column),
            Statistic::Mean => dialect.mean(&column),
            Statistic::Variance => dialect.variance(&column),
            Statistic::Covariance { with } => dialect.covariance(&column, &self.identifier(with)?),
            Statistic::Correlation { with } => {
                dialect.correlation(&column, &self.identifier(with)?)
            }
            Statistic::Percentile { percentile, method } => match method {
                PercentileMethod::Exact => dialect.exact_percentile(&column, *percentile),
                PercentileMethod::Approximate => dialect.approx_percentile(&column, *percentile),
            },
        })
    }

    fn identifier(&self, name: &str) -> Result<String> {
        if self.quote_identifiers {
            SqlSecurity::quote_identifier(name, self.dialect.quote_char())
        } else {
            SqlSecurity::validate_identifier(name)?;
            Ok(name.to_string())
        }
    }

    fn table(&self) -> Result<String> {
        let name = self.dataset.name();
        if self.quote_identifiers {
            SqlSecurity::quote_qualified(name, self.dialect.quote_char())
        } else {
            SqlSecurity::validate_identifier(name)?;
            Ok(name.to_string())
        }
    }

    fn require_numeric(column: &Column) -> Result<()> {
        if column.is_numeric() {
            Ok(())
        } else {
            Err(StatsError::UnsupportedColumnType {
                column: column.name().to_string(),
                kind: column.kind(),
            })
        }
    }
}
