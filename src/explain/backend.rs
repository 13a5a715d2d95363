//! Seams between the capture protocol and the database driver.
//!
//! The MySQL/MariaDB implementation lives in `crate::db`; tests drive the
//! coordinator with scripted in-memory implementations.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::explain::plan::PlanRow;

/// Identifies the physical server a connection is bound to (`@@GLOBAL.hostname`).
pub type BackendInstanceId = String;

/// What a session reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub instance: BackendInstanceId,
    /// Server thread id, the argument to `SHOW EXPLAIN FOR`.
    pub thread_id: u64,
}

/// Opens a request-scoped pool for a schema. Must not perform I/O.
pub trait BackendConnector: Send + Sync {
    type Backend: ExplainBackend;

    fn open(&self, schema: &str) -> Result<Self::Backend, BackendError>;
}

/// A connection pool owned by a single request.
#[async_trait]
pub trait ExplainBackend: Send + Sync {
    type Session: BackendSession + 'static;

    async fn acquire(&self) -> Result<Self::Session, BackendError>;

    /// Shut the pool down. Called exactly once, after every session is released.
    async fn close(&self);
}

/// An exclusively owned pooled connection. Dropping it returns it to the pool.
#[async_trait]
pub trait BackendSession: Send {
    async fn use_schema(&mut self, schema: &str) -> Result<(), BackendError>;

    async fn identify(&mut self) -> Result<SessionIdentity, BackendError>;

    async fn arm_statement_time(&mut self, limit: Duration) -> Result<(), BackendError>;

    /// Run a statement to completion, discarding its rows.
    async fn execute(&mut self, sql: &str) -> Result<(), BackendError>;

    async fn show_explain(&mut self, thread_id: u64) -> Result<Vec<PlanRow>, BackendError>;

    /// Close the underlying connection instead of returning it to the pool, so the
    /// next acquire opens a fresh one (possibly routed to another server).
    async fn discard(self) -> Result<(), BackendError>;
}
