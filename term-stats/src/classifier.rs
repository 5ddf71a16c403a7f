//! Column classification into the summary paths.
//!
//! A column goes down exactly one summary path. Numeric columns win over
//! the factor marker, so a numeric column flagged as a factor is summarized
//! by min/max and never by its distinct values.

use crate::schema::{Column, Schema};

/// Columns of a schema grouped by summary path, each in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnClassification {
    pub categorical: Vec<Column>,
    pub numeric: Vec<Column>,
}

impl ColumnClassification {
    /// Numeric columns with an integral declared type.
    pub fn integral(&self) -> impl Iterator<Item = &Column> {
        self.numeric.iter().filter(|column| column.is_integral())
    }

    /// Numeric columns with a fractional declared type.
    pub fn fractional(&self) -> impl Iterator<Item = &Column> {
        self.numeric.iter().filter(|column| column.is_fractional())
    }
}

/// Splits a schema into categorical and numeric columns.
pub fn classify(schema: &Schema) -> ColumnClassification {
    let mut classification = ColumnClassification::default();
    for column in schema.columns() {
        if column.is_numeric() {
            classification.numeric.push(column.clone());
        } else if column.is_categorical() {
            classification.categorical.push(column.clone());
        }
    }
    classification
}

/// Filters `names` down to the numeric columns, keeping the input order.
///
/// Unknown names are reported as [`crate::error::StatsError::ColumnNotFound`].
pub fn numeric_subset<'a>(
    schema: &'a Schema,
    names: &[String],
) -> crate::error::Result<Vec<&'a Column>> {
    let mut numeric = Vec::new();
    for name in names {
        let column = schema.column(name)?;
        if column.is_numeric() {
            numeric.push(column);
        }
    }
    Ok(numeric)
}
