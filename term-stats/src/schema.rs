//! Column metadata as declared by the query engine's schema.

use std::collections::HashSet;
use std::fmt;

use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::sampler::InferredType;

/// Field metadata key that marks an Arrow field as a factor.
pub const FACTOR_METADATA_KEY: &str = "factor";

/// Declared kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Discrete labels
    Categorical,
    /// Whole numbers
    Integral,
    /// Floating point or decimal numbers
    Fractional,
    /// Anything else (free text, dates, booleans, nested values)
    Other,
}

impl ColumnKind {
    /// Returns the lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Categorical => "categorical",
            ColumnKind::Integral => "integral",
            ColumnKind::Fractional => "fractional",
            ColumnKind::Other => "other",
        }
    }

    /// Maps an Arrow data type onto a column kind.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Integral,
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => ColumnKind::Fractional,
            DataType::Dictionary(_, _) => ColumnKind::Categorical,
            _ => ColumnKind::Other,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker flagging a column as categorical, with its known levels if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    /// Levels declared up front; empty when they are only known from data.
    pub levels: Vec<String>,
}

impl Factor {
    /// Creates a factor with declared levels.
    pub fn with_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single column of a dataset schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    factor: Option<Factor>,
}

impl Column {
    /// Creates a column of the given kind.
    ///
    /// Categorical columns always carry a factor marker.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        let factor = (kind == ColumnKind::Categorical).then(Factor::default);
        Self {
            name: name.into(),
            kind,
            factor,
        }
    }

    pub fn integral(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Integral)
    }

    pub fn fractional(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Fractional)
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Categorical)
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Other)
    }

    /// Attaches a factor marker to the column.
    pub fn with_factor(mut self, factor: Factor) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn factor(&self) -> Option<&Factor> {
        self.factor.as_ref()
    }

    pub fn is_integral(&self) -> bool {
        self.kind == ColumnKind::Integral
    }

    pub fn is_fractional(&self) -> bool {
        self.kind == ColumnKind::Fractional
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_fractional()
    }

    /// True when the factor marker is set.
    pub fn is_categorical(&self) -> bool {
        self.factor.is_some()
    }

    /// Converts an Arrow field, honoring the `factor=true` metadata marker.
    pub fn from_arrow_field(field: &Field) -> Self {
        let column = Self::new(field.name(), ColumnKind::from_arrow(field.data_type()));
        let marked = field
            .metadata()
            .get(FACTOR_METADATA_KEY)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        if marked && column.factor.is_none() {
            column.with_factor(Factor::default())
        } else {
            column
        }
    }
}

/// Ordered list of columns with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema, rejecting duplicate column names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(StatsError::invalid_argument(format!(
                    "duplicate column '{}' in schema",
                    column.name()
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Builds a schema from an Arrow schema.
    pub fn from_arrow(schema: &ArrowSchema) -> Result<Self> {
        Self::new(
            schema
                .fields()
                .iter()
                .map(|field| Column::from_arrow_field(field))
                .collect(),
        )
    }

    /// Builds a schema from sampled type guesses.
    pub fn from_inferred(guesses: &[(String, InferredType)]) -> Result<Self> {
        Self::new(
            guesses
                .iter()
                .map(|(name, inferred)| Column::new(name.clone(), inferred.column_kind()))
                .collect(),
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks a column up by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|column| column.name() == name)
            .ok_or_else(|| StatsError::column_not_found(name))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A queryable dataset: the name used inside query text plus its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    schema: Schema,
}

impl Dataset {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
