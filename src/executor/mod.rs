//! Safe query execution seam.
//!
//! The validators never talk to storage. Callers bring whatever execution
//! backend they use behind [`QueryExecutor`], and the wrappers here
//! guarantee a query string reaches it only after validation — and, for the
//! analytics surface, only after the LIMIT rewrite.

use crate::error::{ExecutorResult, ValidationResult};
use crate::validator::{AllowlistGuard, QueryRequest, QueryValidator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Generic query result: column names plus row values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
        }
    }

    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }
}

/// Async execution backend for already-validated SQL.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes a SQL string and returns the resulting rows.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::ExecutionFailed`](crate::error::ExecutorError::ExecutionFailed)
    /// if the backend rejects or fails the query.
    async fn execute(&self, sql: &str) -> ExecutorResult<QueryResult>;
}

/// Executor wrapper that validates every query before delegating.
///
/// A rejected query never reaches the backend: accept/reject is atomic and
/// there is no partial execution.
pub struct SafeQueryExecutor<E> {
    executor: E,
    validator: QueryValidator,
}

impl<E: QueryExecutor> SafeQueryExecutor<E> {
    pub fn new(executor: E, validator: QueryValidator) -> Self {
        Self {
            executor,
            validator,
        }
    }

    pub fn validator(&self) -> &QueryValidator {
        &self.validator
    }

    /// Validate `query`, then execute the already-known-safe string.
    pub async fn execute_query(&self, query: &str) -> ExecutorResult<QueryResult> {
        self.validator.validate(query)?;
        debug!("query validated, executing");
        self.executor.execute(query).await
    }

    /// Validation without execution, for callers that surface errors early.
    pub fn check(&self, query: &str) -> ValidationResult<()> {
        self.validator.validate(query)
    }
}

/// Executor wrapper for the analytics surface: request-schema checks, the
/// allow-list guard, then the LIMIT rewrite, then execution.
pub struct AllowlistExecutor<E> {
    executor: E,
    guard: AllowlistGuard,
}

impl<E: QueryExecutor> AllowlistExecutor<E> {
    pub fn new(executor: E, guard: AllowlistGuard) -> Self {
        Self { executor, guard }
    }

    pub fn guard(&self) -> &AllowlistGuard {
        &self.guard
    }

    pub async fn execute_request(&self, request: &QueryRequest) -> ExecutorResult<QueryResult> {
        request.validate()?;
        self.guard.validate(&request.query)?;

        let sql = self.guard.prepare_for_execution(&request.query, request.limit);
        debug!(limit = request.limit, "analytics query validated, executing");
        self.executor.execute(&sql).await
    }
}
