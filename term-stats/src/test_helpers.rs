//! Scripted query engine for handler tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::{CellValue, QueryEngine, ResultCursor, RowCursor};
use crate::error::{Result, StatsError};

struct Response {
    pattern: Option<String>,
    delay: Duration,
    columns: usize,
    rows: Vec<Vec<CellValue>>,
}

/// Records every query it receives and answers with scripted rows.
///
/// Responses registered with [`FakeEngine::respond`] are consumed in order;
/// those registered with [`FakeEngine::respond_to`] answer the first query
/// containing their pattern, optionally after a delay.
#[derive(Default)]
pub struct FakeEngine {
    responses: Mutex<VecDeque<Response>>,
    queries: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    failure: Mutex<Option<StatsError>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, columns: usize, rows: Vec<Vec<CellValue>>) {
        self.push(None, Duration::ZERO, columns, rows);
    }

    pub fn respond_to(&self, pattern: &str, columns: usize, rows: Vec<Vec<CellValue>>) {
        self.push(Some(pattern.to_string()), Duration::ZERO, columns, rows);
    }

    /// Like [`FakeEngine::respond_to`], answering only after `delay`.
    pub fn respond_to_after(
        &self,
        pattern: &str,
        delay: Duration,
        columns: usize,
        rows: Vec<Vec<CellValue>>,
    ) {
        self.push(Some(pattern.to_string()), delay, columns, rows);
    }

    /// Queries in the order their results were handed back.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    /// Makes the next query fail with `error`.
    pub fn fail_with(&self, error: StatsError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn push(
        &self,
        pattern: Option<String>,
        delay: Duration,
        columns: usize,
        rows: Vec<Vec<CellValue>>,
    ) {
        self.responses.lock().unwrap().push_back(Response {
            pattern,
            delay,
            columns,
            rows,
        });
    }
}

#[async_trait]
impl QueryEngine for FakeEngine {
    async fn execute(&self, query: &str) -> Result<Box<dyn ResultCursor>> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }

        let response = {
            let mut responses = self.responses.lock().unwrap();
            let index = responses
                .iter()
                .position(|response| match &response.pattern {
                    Some(pattern) => query.contains(pattern.as_str()),
                    None => true,
                })
                .ok_or_else(|| StatsError::engine(format!("no scripted response for: {query}")))?;
            responses
                .remove(index)
                .ok_or_else(|| StatsError::engine("scripted response vanished"))?
        };

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        self.completed.lock().unwrap().push(query.to_string());
        Ok(Box::new(RowCursor::new(response.columns, response.rows)?))
    }
}
