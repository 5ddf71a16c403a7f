//! Caller-facing statistics operations over one dataset.
//!
//! Each operation classifies columns locally, builds one packed query, runs
//! it on the engine, and decodes the single result before returning. The
//! simple summary is the exception: one distinct-values query per
//! categorical column plus one range query for all numeric columns.
//!
//! # Example
//!
//! ```rust,no_run
//! use datafusion::prelude::*;
//! use term_stats::handler::StatisticsHandler;
//!
//! # async fn example() -> term_stats::error::Result<()> {
//! let ctx = SessionContext::new();
//! ctx.register_csv("people", "people.csv", CsvReadOptions::new()).await?;
//!
//! let stats = StatisticsHandler::for_datafusion(ctx, "people").await?;
//! for summary in stats.simple_summary().await? {
//!     println!("{summary:?}");
//! }
//!
//! let five = stats.five_num_summary(&["age", "city"]).await?;
//! let variance = stats.variance("age").await?;
//! println!("{five:?} sd={}", variance.std_dev());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::classifier::{classify, numeric_subset};
use crate::decoder;
use crate::engine::{DataFusionEngine, QueryEngine, ResultCursor};
use crate::error::{Result, StatsError};
use crate::logging::LogConfig;
use crate::query::{
    DataFusionDialect, Dialect, PackedQuery, PercentileSet, QueryBuilder, Statistic,
};
use crate::schema::{Column, Dataset};
use crate::summary::{
    FiveNumSummary, QuantileResult, SimpleSummary, VarianceResult,
};
use crate::{log_decode, log_query};

/// Configuration for [`StatisticsHandler`].
#[derive(Debug, Clone)]
pub struct StatisticsConfig {
    /// Logging behavior for queries and decoded values
    pub log: LogConfig,
    /// Issue the per-column distinct queries of the simple summary concurrently (default: false)
    pub concurrent_categorical: bool,
    /// Validate and quote identifiers placed in query text (default: true)
    pub escape_identifiers: bool,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            concurrent_categorical: false,
            escape_identifiers: true,
        }
    }
}

impl StatisticsConfig {
    pub fn builder() -> StatisticsConfigBuilder {
        StatisticsConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`StatisticsConfig`].
pub struct StatisticsConfigBuilder {
    config: StatisticsConfig,
}

impl StatisticsConfigBuilder {
    pub fn log(mut self, log: LogConfig) -> Self {
        self.config.log = log;
        self
    }

    pub fn concurrent_categorical(mut self, enable: bool) -> Self {
        self.config.concurrent_categorical = enable;
        self
    }

    pub fn escape_identifiers(mut self, enable: bool) -> Self {
        self.config.escape_identifiers = enable;
        self
    }

    pub fn build(self) -> StatisticsConfig {
        self.config
    }
}

/// Computes summary statistics for one dataset through a query engine.
#[derive(Clone)]
pub struct StatisticsHandler {
    engine: Arc<dyn QueryEngine>,
    dialect: Arc<dyn Dialect>,
    dataset: Dataset,
    config: StatisticsConfig,
}

impl std::fmt::Debug for StatisticsHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsHandler")
            .field("dataset", &self.dataset.name())
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .finish()
    }
}

impl StatisticsHandler {
    pub fn new(engine: Arc<dyn QueryEngine>, dialect: Arc<dyn Dialect>, dataset: Dataset) -> Self {
        Self {
            engine,
            dialect,
            dataset,
            config: StatisticsConfig::default(),
        }
    }

    /// Handler for a table registered in a DataFusion session.
    pub async fn for_datafusion(
        ctx: datafusion::prelude::SessionContext,
        table_name: &str,
    ) -> Result<Self> {
        let engine = DataFusionEngine::new(ctx);
        let dataset = engine.dataset(table_name).await?;
        Ok(Self::new(
            Arc::new(engine),
            Arc::new(DataFusionDialect),
            dataset,
        ))
    }

    pub fn with_config(mut self, config: StatisticsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &StatisticsConfig {
        &self.config
    }

    fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.dataset, self.dialect.as_ref())
            .quote_identifiers(self.config.escape_identifiers)
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.dataset.schema().column(name)
    }

    async fn run(&self, query: &PackedQuery) -> Result<Box<dyn ResultCursor>> {
        log_query!(self.config.log, query.query());
        self.engine.execute(query.query()).await
    }

    /// Distinct values of every categorical column, then the range of every
    /// numeric column, each group in schema order.
    #[instrument(skip(self), fields(dataset = %self.dataset.name()))]
    pub async fn simple_summary(&self) -> Result<Vec<SimpleSummary>> {
        let classification = classify(self.dataset.schema());
        let builder = self.builder();

        let distinct_queries = classification
            .categorical
            .iter()
            .map(|column| builder.distinct_values(column))
            .collect::<Result<Vec<_>>>()?;

        let decode_distinct = |query: PackedQuery| async move {
            let mut cursor = self.run(&query).await?;
            decoder::decode_distinct(cursor.as_mut(), &query)
        };

        let categorical = if self.config.concurrent_categorical {
            try_join_all(distinct_queries.into_iter().map(decode_distinct)).await?
        } else {
            let mut summaries = Vec::with_capacity(distinct_queries.len());
            for query in distinct_queries {
                summaries.push(decode_distinct(query).await?);
            }
            summaries
        };

        let numeric = if classification.numeric.is_empty() {
            Vec::new()
        } else {
            let query = builder.numeric_range(&classification.numeric)?;
            let mut cursor = self.run(&query).await?;
            decoder::decode_numeric_range(cursor.as_mut(), &query)?
        };

        info!(
            categorical = categorical.len(),
            numeric = numeric.len(),
            "Computed simple summary"
        );

        Ok(categorical
            .into_iter()
            .map(SimpleSummary::Categorical)
            .chain(numeric.into_iter().map(SimpleSummary::Numeric))
            .collect())
    }

    /// One five-number summary per requested name, in request order.
    ///
    /// Non-numeric columns get the all-NaN summary.
    #[instrument(skip(self, column_names), fields(dataset = %self.dataset.name()))]
    pub async fn five_num_summary<S: AsRef<str>>(
        &self,
        column_names: &[S],
    ) -> Result<Vec<FiveNumSummary>> {
        if column_names.is_empty() {
            return Err(StatsError::invalid_argument(
                "five-number summary needs at least one column",
            ));
        }
        let requested: Vec<String> = column_names
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        let numeric = numeric_subset(self.dataset.schema(), &requested)?;

        let summaries = if numeric.is_empty() {
            decoder::decode_five_number(None, None, &requested)?
        } else {
            let query = self.builder().five_number(&numeric)?;
            let mut cursor = self.run(&query).await?;
            let cursor: &mut dyn ResultCursor = cursor.as_mut();
            decoder::decode_five_number(Some(cursor), Some(&query), &requested)?
        };

        log_decode!(self.config.log, summaries = ?summaries, "Decoded five-number summaries");
        info!(
            requested = requested.len(),
            numeric = numeric.len(),
            "Computed five-number summary"
        );
        Ok(summaries)
    }

    /// Values of a numeric column at the given percentiles.
    ///
    /// Duplicate percentiles are collapsed and the result is ascending.
    #[instrument(skip(self, percentiles), fields(dataset = %self.dataset.name()))]
    pub async fn quantiles(&self, column_name: &str, percentiles: &[f64]) -> Result<QuantileResult> {
        let column = self.column(column_name)?;
        let set = PercentileSet::new(percentiles)?;
        let query = self.builder().quantiles(column, &set)?;
        let mut cursor = self.run(&query).await?;
        let result = decoder::decode_quantiles(cursor.as_mut(), &query, &set)?;
        log_decode!(self.config.log, values = ?result.values, "Decoded quantiles");
        info!(slots = query.width(), "Computed quantiles");
        Ok(result)
    }

    /// Sample variance and standard deviation.
    #[instrument(skip(self), fields(dataset = %self.dataset.name()))]
    pub async fn variance(&self, column_name: &str) -> Result<VarianceResult> {
        let query = self
            .builder()
            .scalar(self.column(column_name)?, Statistic::Variance)?;
        let mut cursor = self.run(&query).await?;
        let result = decoder::decode_variance(cursor.as_mut(), &query)?;
        log_decode!(self.config.log, variance = result.variance(), "Decoded variance");
        info!(slots = query.width(), "Computed variance");
        Ok(result)
    }

    #[instrument(skip(self), fields(dataset = %self.dataset.name()))]
    pub async fn mean(&self, column_name: &str) -> Result<f64> {
        self.scalar(column_name, Statistic::Mean).await
    }

    #[instrument(skip(self), fields(dataset = %self.dataset.name()))]
    pub async fn min(&self, column_name: &str) -> Result<f64> {
        self.scalar(column_name, Statistic::Min).await
    }

    #[instrument(skip(self), fields(dataset = %self.dataset.name()))]
    pub async fn max(&self, column_name: &str) -> Result<f64> {
        self.scalar(column_name, Statistic::Max).await
    }

    /// Pearson correlation of two columns.
    #[instrument(skip(self), fields(dataset = %self.dataset.name()))]
    pub async fn correlation(&self, x: &str, y: &str) -> Result<f64> {
        self.column(y)?;
        self.scalar(
            x,
            Statistic::Correlation {
                with: y.to_string(),
            },
        )
        .await
    }

    /// Sample covariance of two columns.
    #[instrument(skip(self), fields(dataset = %self.dataset.name()))]
    pub async fn covariance(&self, x: &str, y: &str) -> Result<f64> {
        self.column(y)?;
        self.scalar(
            x,
            Statistic::Covariance {
                with: y.to_string(),
            },
        )
        .await
    }

    async fn scalar(&self, column_name: &str, statistic: Statistic) -> Result<f64> {
        let query = self.builder().scalar(self.column(column_name)?, statistic)?;
        let mut cursor = self.run(&query).await?;
        let value = decoder::decode_scalar(cursor.as_mut(), &query)?;
        log_decode!(self.config.log, value, "Decoded scalar statistic");
        info!(slots = query.width(), "Computed scalar statistic");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CellValue;
    use crate::query::HiveDialect;
    use crate::schema::{Factor, Schema};
    use crate::test_helpers::FakeEngine;
    use std::time::Duration;

    fn dataset() -> Dataset {
        Dataset::new(
            "people",
            Schema::new(vec![
                Column::categorical("city"),
                Column::integral("age"),
                Column::other("note"),
                Column::fractional("income"),
                Column::categorical("state"),
            ])
            .unwrap(),
        )
    }

    fn handler(engine: &Arc<FakeEngine>) -> StatisticsHandler {
        StatisticsHandler::new(engine.clone(), Arc::new(HiveDialect), dataset())
    }

    #[tokio::test]
    async fn test_simple_summary_query_plan() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond(1, vec![vec!["paris".into()], vec!["lyon".into()]]);
        engine.respond(1, vec![vec!["ca".into()], vec![CellValue::Null]]);
        engine.respond(
            4,
            vec![vec![18.0.into(), 65.0.into(), CellValue::Null, CellValue::Null]],
        );

        let summaries = handler(&engine).simple_summary().await.unwrap();

        assert_eq!(
            engine.queries(),
            vec![
                "SELECT DISTINCT `city` FROM `people` WHERE `city` IS NOT NULL",
                "SELECT DISTINCT `state` FROM `people` WHERE `state` IS NOT NULL",
                "SELECT MIN(`age`), MAX(`age`), MIN(`income`), MAX(`income`) FROM `people`",
            ]
        );
        let columns: Vec<&str> = summaries.iter().map(SimpleSummary::column).collect();
        assert_eq!(columns, vec!["city", "state", "age", "income"]);
        assert_eq!(
            summaries[0].as_categorical().unwrap().values,
            vec!["paris", "lyon"]
        );
        assert_eq!(summaries[1].as_categorical().unwrap().values, vec!["ca"]);
        assert_eq!(summaries[2].as_numeric().unwrap().max, 65.0);
        assert!(summaries[3].as_numeric().unwrap().min.is_nan());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simple_summary_concurrent_keeps_order() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond_to_after(
            "`city`",
            Duration::from_millis(50),
            1,
            vec![vec!["paris".into()]],
        );
        engine.respond_to("`state`", 1, vec![vec!["ca".into()]]);
        engine.respond_to("MIN(", 4, vec![vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()]]);

        let config = StatisticsConfig::builder().concurrent_categorical(true).build();
        let summaries = handler(&engine)
            .with_config(config)
            .simple_summary()
            .await
            .unwrap();

        // state answered before city
        let completed = engine.completed();
        assert!(completed[0].contains("`state`"));
        assert!(completed[1].contains("`city`"));

        let columns: Vec<&str> = summaries.iter().map(SimpleSummary::column).collect();
        assert_eq!(columns, vec!["city", "state", "age", "income"]);
        assert_eq!(summaries[0].as_categorical().unwrap().values, vec!["paris"]);
        assert_eq!(summaries[1].as_categorical().unwrap().values, vec!["ca"]);
    }

    #[tokio::test]
    async fn test_simple_summary_with_free_form_column_names() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond(1, vec![vec!["Zürich".into()]]);
        engine.respond(2, vec![vec![1.5.into(), 9.0.into()]]);
        let dataset = Dataset::new(
            "sales",
            Schema::new(vec![
                Column::categorical("store city"),
                Column::fractional("unit price"),
            ])
            .unwrap(),
        );
        let handler = StatisticsHandler::new(engine.clone(), Arc::new(HiveDialect), dataset);

        let summaries = handler.simple_summary().await.unwrap();

        assert_eq!(
            engine.queries(),
            vec![
                "SELECT DISTINCT `store city` FROM `sales` WHERE `store city` IS NOT NULL",
                "SELECT MIN(`unit price`), MAX(`unit price`) FROM `sales`",
            ]
        );
        assert_eq!(summaries[0].column(), "store city");
        assert_eq!(summaries[1].as_numeric().unwrap().max, 9.0);
    }

    #[tokio::test]
    async fn test_unquoted_mode_rejects_free_form_names() {
        let engine = Arc::new(FakeEngine::new());
        let dataset = Dataset::new(
            "sales",
            Schema::new(vec![Column::fractional("unit price")]).unwrap(),
        );
        let config = StatisticsConfig::builder().escape_identifiers(false).build();
        let handler = StatisticsHandler::new(engine.clone(), Arc::new(HiveDialect), dataset)
            .with_config(config);

        let err = handler.mean("unit price").await.unwrap_err();
        assert!(matches!(err, StatsError::Security(_)));
        assert!(engine.queries().is_empty());
    }

    #[tokio::test]
    async fn test_simple_summary_without_numeric_columns() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond(1, vec![vec!["x".into()]]);
        let dataset = Dataset::new(
            "t",
            Schema::new(vec![
                Column::other("free"),
                Column::other("label").with_factor(Factor::default()),
            ])
            .unwrap(),
        );
        let handler = StatisticsHandler::new(engine.clone(), Arc::new(HiveDialect), dataset);
        let summaries = handler.simple_summary().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(engine.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_five_num_summary_mixed_columns() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond(
            5,
            vec![vec![
                18.0.into(),
                25.0.into(),
                30.0.into(),
                40.0.into(),
                65.0.into(),
            ]],
        );

        let summaries = handler(&engine)
            .five_num_summary(&["age", "city"])
            .await
            .unwrap();

        assert_eq!(summaries[0].column, "age");
        assert_eq!(summaries[0].values(), [18.0, 25.0, 30.0, 40.0, 65.0]);
        assert_eq!(summaries[1].column, "city");
        assert!(summaries[1].is_undefined());
        assert_eq!(engine.queries().len(), 1);
        assert!(!engine.queries()[0].contains("city"));
    }

    #[tokio::test]
    async fn test_five_num_summary_only_non_numeric_skips_engine() {
        let engine = Arc::new(FakeEngine::new());
        let summaries = handler(&engine)
            .five_num_summary(&["city", "note"])
            .await
            .unwrap();
        assert!(summaries.iter().all(FiveNumSummary::is_undefined));
        assert!(engine.queries().is_empty());
    }

    #[tokio::test]
    async fn test_five_num_summary_argument_errors() {
        let engine = Arc::new(FakeEngine::new());
        let empty: [&str; 0] = [];
        assert!(matches!(
            handler(&engine).five_num_summary(&empty).await,
            Err(StatsError::InvalidArgument(_))
        ));
        assert!(matches!(
            handler(&engine).five_num_summary(&["missing"]).await,
            Err(StatsError::ColumnNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_quantiles_round_trip() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond(3, vec![vec![50.0.into(), 10.0.into(), 90.0.into()]]);

        let result = handler(&engine)
            .quantiles("income", &[1.0, 0.5, 0.0, 0.5])
            .await
            .unwrap();

        assert_eq!(
            engine.queries(),
            vec![
                "SELECT percentile_approx(`income`, 0.5), MIN(`income`), MAX(`income`) FROM `people`"
            ]
        );
        assert_eq!(result.percentiles, vec![0.0, 0.5, 1.0]);
        assert_eq!(result.values, vec![10.0, 50.0, 90.0]);
    }

    #[tokio::test]
    async fn test_quantiles_on_categorical_column_fails_before_engine() {
        let engine = Arc::new(FakeEngine::new());
        let err = handler(&engine).quantiles("city", &[0.5]).await.unwrap_err();
        assert!(matches!(err, StatsError::UnsupportedColumnType { .. }));
        assert!(engine.queries().is_empty());
    }

    #[tokio::test]
    async fn test_scalar_statistics() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond(1, vec![vec![9.0.into()]]);
        engine.respond(1, vec![vec![42.5.into()]]);
        engine.respond(1, vec![vec![0.8.into()]]);
        engine.respond(1, vec![vec![CellValue::Null]]);

        let stats = handler(&engine);
        let variance = stats.variance("age").await.unwrap();
        assert_eq!((variance.variance(), variance.std_dev()), (9.0, 3.0));
        assert_eq!(stats.mean("income").await.unwrap(), 42.5);
        assert_eq!(stats.correlation("age", "income").await.unwrap(), 0.8);
        assert!(stats.covariance("age", "income").await.unwrap().is_nan());

        assert_eq!(
            engine.queries(),
            vec![
                "SELECT VAR_SAMP(`age`) FROM `people`",
                "SELECT AVG(`income`) FROM `people`",
                "SELECT CORR(`age`, `income`) FROM `people`",
                "SELECT COVAR_SAMP(`age`, `income`) FROM `people`",
            ]
        );
    }

    #[tokio::test]
    async fn test_scalar_zero_rows_fails() {
        let engine = Arc::new(FakeEngine::new());
        engine.respond(1, vec![]);
        let err = handler(&engine).max("age").await.unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[tokio::test]
    async fn test_pairwise_unknown_column() {
        let engine = Arc::new(FakeEngine::new());
        let err = handler(&engine)
            .correlation("age", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::ColumnNotFound { column } if column == "missing"));
        assert!(engine.queries().is_empty());
    }

    #[tokio::test]
    async fn test_engine_errors_propagate_unchanged() {
        let engine = Arc::new(FakeEngine::new());
        engine.fail_with(StatsError::UnsupportedSource("s3://bucket".to_string()));
        let err = handler(&engine).min("age").await.unwrap_err();
        assert!(matches!(err, StatsError::UnsupportedSource(source) if source == "s3://bucket"));
    }
}
