//! DataFusion-backed query engine.

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::common::TableReference;
use datafusion::prelude::*;
use tracing::{debug, instrument};

use super::{QueryEngine, ResultCursor};
use crate::error::{Result, StatsError};
use crate::schema::{Dataset, Schema};

/// Runs statistics queries on a DataFusion [`SessionContext`].
///
/// # Example
///
/// ```rust,no_run
/// use datafusion::prelude::*;
/// use term_stats::engine::DataFusionEngine;
///
/// # async fn example() -> term_stats::error::Result<()> {
/// let ctx = SessionContext::new();
/// ctx.register_csv("people", "people.csv", CsvReadOptions::new()).await?;
///
/// let engine = DataFusionEngine::new(ctx);
/// let dataset = engine.dataset("people").await?;
/// println!("{} columns", dataset.schema().len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DataFusionEngine {
    ctx: SessionContext,
}

impl DataFusionEngine {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Describes a registered table as a [`Dataset`].
    #[instrument(skip(self))]
    pub async fn dataset(&self, table_name: &str) -> Result<Dataset> {
        let table = self.ctx.table(table_reference(table_name)).await?;
        let schema = Schema::from_arrow(table.schema().as_arrow())?;
        debug!(columns = schema.len(), "Resolved dataset schema");
        Ok(Dataset::new(table_name, schema))
    }
}

/// Resolves a dataset name the way quoted query text refers to it: each
/// dot-separated segment is taken verbatim, without case folding.
fn table_reference(name: &str) -> TableReference {
    let segments: Vec<&str> = name.split('.').collect();
    match segments.as_slice() {
        [schema, table] => TableReference::partial(*schema, *table),
        [catalog, schema, table] => TableReference::full(*catalog, *schema, *table),
        _ => TableReference::bare(name),
    }
}

impl std::fmt::Debug for DataFusionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionEngine")
            .field("session_id", &self.ctx.session_id())
            .finish()
    }
}

#[async_trait]
impl QueryEngine for DataFusionEngine {
    async fn execute(&self, query: &str) -> Result<Box<dyn ResultCursor>> {
        let df = self.ctx.sql(query).await?;
        let columns = df.schema().fields().len();
        let batches = df.collect().await?;
        Ok(Box::new(RecordBatchCursor::new(columns, batches)))
    }
}

/// Cursor over collected Arrow record batches.
///
/// Cells are read by casting them to `Float64` or `Utf8`; a value that
/// cannot be cast is an error, never a silent NULL.
#[derive(Debug)]
pub struct RecordBatchCursor {
    columns: usize,
    batches: Vec<RecordBatch>,
    batch: usize,
    row: Option<usize>,
}

impl RecordBatchCursor {
    pub fn new(columns: usize, batches: Vec<RecordBatch>) -> Self {
        Self {
            columns,
            batches,
            batch: 0,
            row: None,
        }
    }

    fn cell(&self, index: usize) -> Result<(&ArrayRef, usize)> {
        let row = self
            .row
            .ok_or_else(|| StatsError::contract_violation("cursor is not positioned on a row"))?;
        let batch = self
            .batches
            .get(self.batch)
            .ok_or_else(|| StatsError::contract_violation("cursor is exhausted"))?;
        if index >= batch.num_columns() {
            return Err(StatsError::contract_violation(format!(
                "cell index {index} out of range for {} result columns",
                batch.num_columns()
            )));
        }
        Ok((batch.column(index), row))
    }

    fn cast_cell(&self, index: usize, to: &DataType) -> Result<Option<ArrayRef>> {
        let (column, row) = self.cell(index)?;
        if column.is_null(row) {
            return Ok(None);
        }
        let options = CastOptions {
            safe: false,
            ..Default::default()
        };
        let cast = cast_with_options(&column.slice(row, 1), to, &options).map_err(|e| {
            StatsError::contract_violation(format!(
                "cell {index} of type {} cannot be read as {to}: {e}",
                column.data_type()
            ))
        })?;
        Ok(Some(cast))
    }
}

impl ResultCursor for RecordBatchCursor {
    fn advance(&mut self) -> bool {
        let mut next = self.row.map_or(0, |row| row + 1);
        while let Some(batch) = self.batches.get(self.batch) {
            if next < batch.num_rows() {
                self.row = Some(next);
                return true;
            }
            self.batch += 1;
            next = 0;
        }
        self.row = None;
        false
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn get_string(&self, index: usize) -> Result<Option<String>> {
        let Some(array) = self.cast_cell(index, &DataType::Utf8)? else {
            return Ok(None);
        };
        let strings = array
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| StatsError::contract_violation("expected Utf8 after cast"))?;
        Ok(Some(strings.value(0).to_string()))
    }

    fn get_double(&self, index: usize) -> Result<Option<f64>> {
        let Some(array) = self.cast_cell(index, &DataType::Float64)? else {
            return Ok(None);
        };
        let doubles = array
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| StatsError::contract_violation("expected Float64 after cast"))?;
        Ok(Some(doubles.value(0)))
    }
}
