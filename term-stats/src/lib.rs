//! # Term Stats - Summary Statistics over Query Engines
//!
//! Term Stats profiles tabular datasets without scanning data itself. Every
//! statistic is compiled into a packed aggregate query, sent to a
//! [`QueryEngine`](engine::QueryEngine), and decoded from the engine's single
//! result row. DataFusion is the bundled engine; other engines plug in through
//! the same trait with their own SQL [`Dialect`](query::Dialect).
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use arrow::array::{Float64Array, Int64Array, StringArray};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use datafusion::prelude::*;
//! use term_stats::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("age", DataType::Int64, true),
//!     Field::new("income", DataType::Float64, true),
//!     Field::new("city", DataType::Utf8, true),
//! ]));
//! let batch = RecordBatch::try_new(
//!     schema,
//!     vec![
//!         Arc::new(Int64Array::from(vec![18, 25, 30])),
//!         Arc::new(Float64Array::from(vec![10.5, 20.0, 31.25])),
//!         Arc::new(StringArray::from(vec!["paris", "lyon", "paris"])),
//!     ],
//! )?;
//!
//! let ctx = SessionContext::new();
//! ctx.register_batch("people", batch)?;
//!
//! let stats = StatisticsHandler::for_datafusion(ctx, "people").await?;
//! let summary = stats.simple_summary().await?;
//! let quartiles = stats.quantiles("income", &[0.25, 0.5, 0.75]).await?;
//! let sd = stats.variance("age").await?.std_dev();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`schema`**: Column kinds, factor markers, and the dataset handle
//! - **`classifier`**: Splits columns into the categorical and numeric summary paths
//! - **`sampler`**: Infers column types from short samples of raw text
//! - **`query`**: Builds packed aggregate queries and their slot layouts
//! - **`engine`**: The query engine boundary and the DataFusion engine
//! - **`decoder`**: Reads packed results back into typed statistics
//! - **`handler`**: The caller-facing operations
//! - **`security`**: Identifier validation and quoting

pub mod classifier;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod handler;
pub mod logging;
pub mod prelude;
pub mod query;
pub mod sampler;
pub mod schema;
pub mod security;
pub mod summary;

#[cfg(test)]
pub mod test_helpers;
