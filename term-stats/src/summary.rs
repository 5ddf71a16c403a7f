//! Typed statistics returned to callers.
//!
//! NaN stands for "undefined for this column": a numeric column without
//! non-null values, or a five-number summary of a non-numeric column.

use serde::{Deserialize, Serialize};

/// Distinct non-null values of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    /// Deduplicated, in the order the engine returned them.
    pub values: Vec<String>,
}

/// Range of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

/// Single-pass summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SimpleSummary {
    Categorical(CategoricalSummary),
    Numeric(NumericSummary),
}

impl SimpleSummary {
    pub fn column(&self) -> &str {
        match self {
            SimpleSummary::Categorical(summary) => &summary.column,
            SimpleSummary::Numeric(summary) => &summary.column,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalSummary> {
        match self {
            SimpleSummary::Categorical(summary) => Some(summary),
            SimpleSummary::Numeric(_) => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericSummary> {
        match self {
            SimpleSummary::Numeric(summary) => Some(summary),
            SimpleSummary::Categorical(_) => None,
        }
    }
}

/// Min, quartiles, and max of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiveNumSummary {
    pub column: String,
    pub min: f64,
    pub first_quartile: f64,
    pub median: f64,
    pub third_quartile: f64,
    pub max: f64,
}

impl FiveNumSummary {
    pub fn new(column: impl Into<String>, values: [f64; 5]) -> Self {
        let [min, first_quartile, median, third_quartile, max] = values;
        Self {
            column: column.into(),
            min,
            first_quartile,
            median,
            third_quartile,
            max,
        }
    }

    /// The summary of a column the statistic is undefined for.
    pub fn undefined(column: impl Into<String>) -> Self {
        Self::new(column, [f64::NAN; 5])
    }

    /// `(min, Q1, median, Q3, max)`
    pub fn values(&self) -> [f64; 5] {
        [
            self.min,
            self.first_quartile,
            self.median,
            self.third_quartile,
            self.max,
        ]
    }

    /// True when all five values are NaN.
    pub fn is_undefined(&self) -> bool {
        self.values().iter().all(|value| value.is_nan())
    }
}

/// Values of a column at the requested percentiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileResult {
    pub column: String,
    /// Requested cut points, deduplicated and ascending.
    pub percentiles: Vec<f64>,
    /// `values[i]` is the value at `percentiles[i]`.
    pub values: Vec<f64>,
}

impl QuantileResult {
    /// Value at an exact requested percentile.
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .position(|&p| p == percentile)
            .and_then(|index| self.values.get(index).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.percentiles
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

/// Sample variance and the standard deviation derived from it.
///
/// Floating error can make a decoded variance slightly negative; it is not
/// clamped, in which case the standard deviation is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceResult {
    variance: f64,
    std_dev: f64,
}

impl VarianceResult {
    pub fn from_variance(variance: f64) -> Self {
        Self {
            variance,
            std_dev: variance.sqrt(),
        }
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_num_undefined() {
        let summary = FiveNumSummary::undefined("city");
        assert!(summary.is_undefined());
        assert_eq!(summary.column, "city");

        let summary = FiveNumSummary::new("age", [18.0, 25.0, 30.0, 40.0, 65.0]);
        assert!(!summary.is_undefined());
        assert_eq!(summary.median, 30.0);
        assert_eq!(summary.values(), [18.0, 25.0, 30.0, 40.0, 65.0]);
    }

    #[test]
    fn test_variance_derives_std_dev() {
        let result = VarianceResult::from_variance(6.25);
        assert_eq!(result.variance(), 6.25);
        assert_eq!(result.std_dev(), 2.5);

        assert!(VarianceResult::from_variance(-1e-12).std_dev().is_nan());
        assert!(VarianceResult::from_variance(f64::NAN).std_dev().is_nan());
    }

    #[test]
    fn test_quantile_lookup() {
        let result = QuantileResult {
            column: "income".to_string(),
            percentiles: vec![0.0, 0.5, 1.0],
            values: vec![10.0, 55.0, 100.0],
        };
        assert_eq!(result.get(0.5), Some(55.0));
        assert_eq!(result.get(0.25), None);
        assert_eq!(result.iter().last(), Some((1.0, 100.0)));
    }

    #[test]
    fn test_quantile_lookup_with_missing_value() {
        let result = QuantileResult {
            column: "income".to_string(),
            percentiles: vec![0.25, 0.75],
            values: vec![10.0],
        };
        assert_eq!(result.get(0.25), Some(10.0));
        assert_eq!(result.get(0.75), None);
    }

    #[test]
    fn test_simple_summary_accessors() {
        let summary = SimpleSummary::Numeric(NumericSummary {
            column: "age".to_string(),
            min: 1.0,
            max: 2.0,
        });
        assert_eq!(summary.column(), "age");
        assert!(summary.as_numeric().is_some());
        assert!(summary.as_categorical().is_none());
    }

    #[test]
    fn test_simple_summary_serialization() {
        let summary = SimpleSummary::Categorical(CategoricalSummary {
            column: "city".to_string(),
            values: vec!["paris".to_string()],
        });
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "categorical");
        assert_eq!(json["values"][0], "paris");

        // NaN has no JSON representation and serializes as null
        let summary = SimpleSummary::Numeric(NumericSummary {
            column: "empty".to_string(),
            min: f64::NAN,
            max: f64::NAN,
        });
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["min"].is_null());
    }
}
