//! Prelude for commonly used types and traits in term-stats.

pub use crate::engine::{DataFusionEngine, QueryEngine, ResultCursor};
pub use crate::error::{Result, StatsError};
pub use crate::handler::{StatisticsConfig, StatisticsHandler};
pub use crate::logging::LogConfig;
pub use crate::query::{DataFusionDialect, Dialect, HiveDialect};
pub use crate::sampler::{InferredType, TypeSampler};
pub use crate::schema::{Column, ColumnKind, Dataset, Schema};
pub use crate::summary::{
    CategoricalSummary, FiveNumSummary, NumericSummary, QuantileResult, SimpleSummary,
    VarianceResult,
};
