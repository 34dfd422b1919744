//! Query execution and result normalization
//!
//! The [`QueryExecutor`] dispatches opaque queries to the owning plugin of a
//! connection, measures wall-clock time strictly around the delegated
//! native call, enforces a caller-supplied timeout, and refreshes the
//! connection's `last_activity` on success. Native backend errors are
//! wrapped uniformly; nothing here retries — retry policy belongs to the
//! caller.

use crate::error::{BackendError, Result};
use crate::plugin::Connection;
use crate::registry::BackendRegistry;
use crate::result::{QueryResult, SchemaInfo};
use metrics::{counter, histogram};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Executes queries and schema introspection against open connections
pub struct QueryExecutor {
    registry: Arc<BackendRegistry>,
}

impl QueryExecutor {
    /// Create an executor over the given registry
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self { registry }
    }

    /// Execute a query on an open connection.
    ///
    /// Fails with `ConnectionClosed` when the connection has been
    /// disconnected. With a timeout, the operation fails with
    /// `QueryTimeout` once it elapses and the connection is left open;
    /// canceling outstanding native work is the plugin's responsibility,
    /// but control returns to the caller regardless.
    pub async fn execute_query(
        &self,
        conn: &mut Connection,
        query: &str,
        params: Option<&[Value]>,
        timeout: Option<Duration>,
    ) -> Result<QueryResult> {
        conn.ensure_open()?;
        let backend = conn.backend.clone();
        let plugin = self.registry.get(&backend)?;

        let start = Instant::now();
        let outcome = match timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, plugin.execute_query(conn, query, params)).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        let timeout_ms = limit.as_millis() as u64;
                        warn!(backend = %backend, timeout_ms, "query timed out");
                        counter!("vantage.queries.timed_out", "backend" => backend.clone())
                            .increment(1);
                        return Err(BackendError::timeout(backend, timeout_ms));
                    }
                }
            }
            None => plugin.execute_query(conn, query, params).await,
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(mut result) => {
                result.execution_time_ms = elapsed_ms;
                conn.touch();
                counter!("vantage.queries.executed", "backend" => backend.clone()).increment(1);
                histogram!("vantage.query.duration_ms", "backend" => backend.clone())
                    .record(elapsed_ms as f64);
                debug!(
                    backend = %backend,
                    query_id = %result.query_id,
                    rows = result.row_count,
                    elapsed_ms,
                    "query executed"
                );
                Ok(result)
            }
            Err(err) => {
                counter!("vantage.queries.failed", "backend" => backend.clone()).increment(1);
                Err(wrap_query_error(&backend, err))
            }
        }
    }

    /// Introspect the schema visible through an open connection.
    ///
    /// Per-container failures are handled inside plugins (empty column
    /// lists); only a whole-introspection failure surfaces as an error.
    pub async fn get_schema(&self, conn: &mut Connection) -> Result<SchemaInfo> {
        conn.ensure_open()?;
        let backend = conn.backend.clone();
        let plugin = self.registry.get(&backend)?;

        let schema = plugin.get_schema(conn).await?;
        conn.touch();
        debug!(
            backend = %backend,
            tables = schema.tables.len(),
            views = schema.views.len(),
            "schema introspected"
        );
        Ok(schema)
    }
}

impl Default for QueryExecutor {
    /// An executor over the process-wide registry
    fn default() -> Self {
        Self::new(crate::registry::global())
    }
}

/// Wrap a native backend error uniformly, preserving taxonomy variants
/// that already carry their own meaning.
fn wrap_query_error(backend: &str, err: BackendError) -> BackendError {
    match err {
        e @ (BackendError::QueryExecution { .. }
        | BackendError::QueryTimeout { .. }
        | BackendError::ConnectionClosed(_)) => e,
        other => BackendError::query(backend, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BackendRegistry;
    use crate::testing::{mock_config, rows_fixture, MockBackend};

    fn executor_with(backend: MockBackend) -> QueryExecutor {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(backend)).unwrap();
        QueryExecutor::new(Arc::new(registry))
    }

    async fn open(executor: &QueryExecutor, name: &str) -> Connection {
        executor
            .registry
            .get(name)
            .unwrap()
            .connect(&mock_config())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_execute_normalizes_and_touches() {
        let executor = executor_with(MockBackend::new("mock").with_rows(rows_fixture()));
        let mut conn = open(&executor, "mock").await;
        let before = conn.last_activity;

        let result = executor
            .execute_query(&mut conn, "anything", None, None)
            .await
            .unwrap();

        assert_eq!(result.row_count, 3);
        assert!(!result.columns.is_empty());
        assert!(conn.last_activity >= before);
    }

    #[tokio::test]
    async fn test_execute_on_closed_connection() {
        let executor = executor_with(MockBackend::new("mock"));
        let mut conn = open(&executor, "mock").await;
        conn.is_connected = false;

        let err = executor
            .execute_query(&mut conn, "q", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_native_errors_wrapped_with_backend_name() {
        let executor = executor_with(MockBackend::new("mock").fail_query("native boom"));
        let mut conn = open(&executor, "mock").await;

        let err = executor
            .execute_query(&mut conn, "q", None, None)
            .await
            .unwrap_err();
        match err {
            BackendError::QueryExecution { backend, message } => {
                assert_eq!(backend, "mock");
                assert!(message.contains("native boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_leaves_connection_open() {
        let executor = executor_with(MockBackend::new("mock").with_query_delay_ms(5_000));
        let mut conn = open(&executor, "mock").await;

        let err = executor
            .execute_query(&mut conn, "q", None, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::QueryTimeout { timeout_ms: 20, .. }));
        assert!(conn.is_connected);
    }

    #[tokio::test]
    async fn test_get_schema_partial_failures_do_not_abort() {
        let executor = executor_with(
            MockBackend::new("mock")
                .with_rows(rows_fixture())
                .with_containers(["orders", "users", "metrics"])
                .failing_container("users"),
        );
        let mut conn = open(&executor, "mock").await;

        let schema = executor.get_schema(&mut conn).await.unwrap();
        assert_eq!(schema.tables.len(), 3);
        let users = schema.find_table("users").unwrap();
        assert!(users.columns.is_empty());
        assert!(!schema.find_table("orders").unwrap().columns.is_empty());
        assert!(!schema.find_table("metrics").unwrap().columns.is_empty());
    }
}
