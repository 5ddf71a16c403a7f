//! The query engine boundary.
//!
//! The statistics core never stores or scans data itself. It hands query
//! text to a [`QueryEngine`] and reads typed cells back from the returned
//! [`ResultCursor`]. [`DataFusionEngine`] is the bundled collaborator;
//! [`RowCursor`] serves engines that materialize rows themselves.

pub mod datafusion_engine;

use async_trait::async_trait;

use crate::error::{Result, StatsError};

pub use self::datafusion_engine::{DataFusionEngine, RecordBatchCursor};

/// An engine able to run query text against named datasets.
///
/// Implementations own any concurrency control, retries, or caching. Dropping
/// the future returned by [`QueryEngine::execute`] must cancel the query.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Runs a query and returns a cursor positioned before the first row.
    async fn execute(&self, query: &str) -> Result<Box<dyn ResultCursor>>;
}

/// Forward-only cursor over query result rows.
pub trait ResultCursor: Send {
    /// Moves to the next row. Returns false once the rows are exhausted.
    fn advance(&mut self) -> bool;

    /// Number of cells in each row.
    fn column_count(&self) -> usize;

    /// Reads a cell of the current row as text. `None` is SQL NULL.
    fn get_string(&self, index: usize) -> Result<Option<String>>;

    /// Reads a cell of the current row as a double. `None` is SQL NULL.
    fn get_double(&self, index: usize) -> Result<Option<f64>>;
}

/// A single materialized cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Double(f64),
    Text(String),
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Double(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Double(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Cursor over rows already held in memory.
#[derive(Debug, Clone)]
pub struct RowCursor {
    columns: usize,
    rows: Vec<Vec<CellValue>>,
    position: Option<usize>,
}

impl RowCursor {
    /// Creates a cursor; every row must have exactly `columns` cells.
    pub fn new(columns: usize, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != columns) {
            return Err(StatsError::engine(format!(
                "row has {} cells, expected {columns}",
                row.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            position: None,
        })
    }

    fn cell(&self, index: usize) -> Result<&CellValue> {
        let row = self
            .position
            .and_then(|position| self.rows.get(position))
            .ok_or_else(|| StatsError::contract_violation("cursor is not positioned on a row"))?;
        row.get(index).ok_or_else(|| {
            StatsError::contract_violation(format!(
                "cell index {index} out of range for {} result columns",
                self.columns
            ))
        })
    }
}

impl ResultCursor for RowCursor {
    fn advance(&mut self) -> bool {
        let next = self.position.map_or(0, |position| position + 1);
        self.position = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn get_string(&self, index: usize) -> Result<Option<String>> {
        Ok(match self.cell(index)? {
            CellValue::Null => None,
            CellValue::Double(value) => Some(value.to_string()),
            CellValue::Text(value) => Some(value.clone()),
        })
    }

    fn get_double(&self, index: usize) -> Result<Option<f64>> {
        match self.cell(index)? {
            CellValue::Null => Ok(None),
            CellValue::Double(value) => Ok(Some(*value)),
            CellValue::Text(value) => value.trim().parse::<f64>().map(Some).map_err(|_| {
                StatsError::contract_violation(format!(
                    "cell {index} holds '{value}', which is not numeric"
                ))
            }),
        }
    }
}
