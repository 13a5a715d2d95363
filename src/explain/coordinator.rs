use std::time::Duration;

use crate::config::ExplainConfig;
use crate::error::{BackendError, OperationError};
use crate::schema::check_schema;

use super::affinity;
use super::backend::{BackendConnector, BackendSession, ExplainBackend};
use super::inject::inject_delay;
use super::plan::PlanRow;
use super::validate::validate;

/// Server error numbers raised when the armed time limit kills the delayed query.
/// 1028 is "Sort aborted", 1969 is "Query execution was interrupted
/// (max_statement_time exceeded)". Both are the expected outcome of a capture.
pub const EXPECTED_INTERRUPTION_CODES: &[u16] = &[1028, 1969];

/// Timing constants of the capture protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Per-row `SLEEP()` injected into the query and the `max_statement_time`
    /// armed on the primary connection.
    pub statement_time: Duration,
    /// How long after dispatch the capture fires. A heuristic, not a
    /// synchronisation point: the query may already be gone by then.
    pub capture_delay: Duration,
    pub max_affinity_attempts: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            statement_time: Duration::from_secs(1),
            capture_delay: Duration::from_millis(500),
            max_affinity_attempts: 100,
        }
    }
}

impl From<&ExplainConfig> for CaptureSettings {
    fn from(cfg: &ExplainConfig) -> Self {
        Self {
            statement_time: Duration::from_secs(cfg.statement_time_secs),
            capture_delay: Duration::from_millis(cfg.capture_delay_ms),
            max_affinity_attempts: cfg.max_affinity_retries,
        }
    }
}

/// Drives one live-plan capture per call: a primary connection runs the delayed
/// query while a second connection on the same server asks for its plan.
pub struct ExplainCoordinator<C> {
    connector: C,
    settings: CaptureSettings,
}

impl<C: BackendConnector> ExplainCoordinator<C> {
    pub fn new(connector: C, settings: CaptureSettings) -> Self {
        Self { connector, settings }
    }

    /// Capture the live execution plan of `sql` against `schema`.
    ///
    /// Validation failures return before any pool exists. Otherwise the
    /// request-scoped pool is closed exactly once, after every connection has
    /// been released, whatever the outcome.
    pub async fn capture(&self, sql: &str, schema: &str) -> Result<Vec<PlanRow>, OperationError> {
        validate(sql)?;
        // The schema names the host to connect to, so it is checked before any pool exists
        check_schema(schema)?;

        let backend = self
            .connector
            .open(schema)
            .map_err(|e| OperationError::schema_selection(e, schema))?;

        let outcome = self.capture_with(&backend, sql, schema).await;
        backend.close().await;

        match &outcome {
            Ok(plan) => tracing::info!(schema, steps = plan.len(), "Captured live execution plan"),
            Err(e) => tracing::info!(schema, kind = e.kind(), "Explain request failed"),
        }
        outcome
    }

    async fn capture_with(
        &self,
        backend: &C::Backend,
        sql: &str,
        schema: &str,
    ) -> Result<Vec<PlanRow>, OperationError> {
        let mut primary = backend
            .acquire()
            .await
            .map_err(|e| OperationError::schema_selection(e, schema))?;
        primary
            .use_schema(schema)
            .await
            .map_err(|e| OperationError::schema_selection(e, schema))?;

        let identity = primary.identify().await.map_err(OperationError::explain_capture)?;
        primary
            .arm_statement_time(self.settings.statement_time)
            .await
            .map_err(OperationError::explain_capture)?;

        let delayed = inject_delay(sql.trim_start(), self.settings.statement_time.as_secs().max(1));
        tracing::debug!(sql = %delayed, thread_id = identity.thread_id, "Dispatching delayed query");

        // The primary connection moves into the task and is released when it ends.
        let dispatch = tokio::spawn(async move { primary.execute(&delayed).await });

        tokio::time::sleep(self.settings.capture_delay).await;
        let captured = self.show_explain(backend, &identity.instance, identity.thread_id).await;

        let executed = match dispatch.await {
            Ok(result) => classify_dispatch(result),
            Err(join_err) => Err(OperationError::QueryExecution(join_err.to_string())),
        };

        executed?;
        captured
    }

    async fn show_explain(
        &self,
        backend: &C::Backend,
        instance: &str,
        thread_id: u64,
    ) -> Result<Vec<PlanRow>, OperationError> {
        let mut explainer =
            affinity::resolve(backend, instance, self.settings.max_affinity_attempts).await?;
        explainer
            .show_explain(thread_id)
            .await
            .map_err(OperationError::explain_capture)
    }
}

/// Map the dispatched query's outcome: finishing early and being killed by the
/// armed limit are both fine, anything else is the user's query failing.
fn classify_dispatch(result: Result<(), BackendError>) -> Result<(), OperationError> {
    match result {
        Ok(()) => {
            tracing::debug!("Delayed query finished before the time limit");
            Ok(())
        }
        Err(e) if e.code.is_some_and(|c| EXPECTED_INTERRUPTION_CODES.contains(&c)) => Ok(()),
        Err(e) => {
            tracing::warn!(code = ?e.code, error = %e, "Delayed query failed");
            Err(OperationError::QueryExecution(e.message))
        }
    }
}
