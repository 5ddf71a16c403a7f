//! SQL dialects for the aggregate expressions a packed query needs.
//!
//! Engines disagree on identifier quoting and on the names and shapes of
//! percentile aggregates; everything else is ANSI and shared.

use std::fmt::Debug;

/// Renders aggregate expressions for one engine's SQL flavor.
///
/// Column arguments arrive already quoted.
pub trait Dialect: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Character used to quote identifiers.
    fn quote_char(&self) -> char {
        '"'
    }

    fn min(&self, column: &str) -> String {
        format!("MIN({column})")
    }

    fn max(&self, column: &str) -> String {
        format!("MAX({column})")
    }

    fn mean(&self, column: &str) -> String {
        format!("AVG({column})")
    }

    /// Sample variance (n - 1 denominator).
    fn variance(&self, column: &str) -> String {
        format!("VAR_SAMP({column})")
    }

    /// Sample covariance (n - 1 denominator).
    fn covariance(&self, x: &str, y: &str) -> String {
        format!("COVAR_SAMP({x}, {y})")
    }

    /// Pearson correlation.
    fn correlation(&self, x: &str, y: &str) -> String {
        format!("CORR({x}, {y})")
    }

    /// Exact percentile, used for integral columns.
    fn exact_percentile(&self, column: &str, percentile: f64) -> String;

    /// Approximate percentile, used for fractional columns.
    fn approx_percentile(&self, column: &str, percentile: f64) -> String;
}

/// Hive / Spark SQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct HiveDialect;

impl Dialect for HiveDialect {
    fn name(&self) -> &'static str {
        "hive"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn exact_percentile(&self, column: &str, percentile: f64) -> String {
        format!("percentile({column}, {percentile})")
    }

    fn approx_percentile(&self, column: &str, percentile: f64) -> String {
        format!("percentile_approx({column}, {percentile})")
    }
}

/// Apache DataFusion.
///
/// DataFusion has no general exact percentile aggregate, so exact requests
/// other than the median fall back to `APPROX_PERCENTILE_CONT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataFusionDialect;

impl Dialect for DataFusionDialect {
    fn name(&self) -> &'static str {
        "datafusion"
    }

    fn exact_percentile(&self, column: &str, percentile: f64) -> String {
        if percentile == 0.5 {
            format!("MEDIAN({column})")
        } else {
            self.approx_percentile(column, percentile)
        }
    }

    fn approx_percentile(&self, column: &str, percentile: f64) -> String {
        format!("APPROX_PERCENTILE_CONT({percentile}) WITHIN GROUP (ORDER BY {column})")
    }
}
