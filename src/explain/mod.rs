//! Live execution-plan capture.
//!
//! The replicas this tool targets cannot `EXPLAIN` arbitrary statements for
//! us, but MariaDB can report the plan of a statement that is *running* on
//! another thread (`SHOW EXPLAIN FOR <thread id>`). So each request:
//!
//! - `validate`: refuses statements that would fight the protocol
//! - `inject`: rewrites the SELECT so it sleeps per row
//! - `coordinator`: runs it on one connection, capped by `max_statement_time`,
//!   and asks for its plan from a second connection on the same server
//! - `affinity`: finds that second connection behind the load balancer
//!
//! The captured plan then goes through [`crate::tips::analyze`].

pub mod affinity;
pub mod backend;
pub mod coordinator;
pub mod inject;
pub mod plan;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;

use crate::error::OperationError;
use crate::tips::{self, TipSet};

pub use backend::{BackendConnector, BackendInstanceId, BackendSession, ExplainBackend, SessionIdentity};
pub use coordinator::{CaptureSettings, ExplainCoordinator, EXPECTED_INTERRUPTION_CODES};
pub use inject::inject_delay;
pub use plan::PlanRow;
pub use validate::{extract_use, validate};

/// Successful result of an explain request.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainReport {
    /// The SQL that was explained, after any leading `USE` was removed.
    pub sql: String,
    pub schema: String,
    pub tips: TipSet,
    pub plan: Vec<PlanRow>,
}

/// Explain `sql` against `schema` and annotate the plan with tips.
///
/// A leading `USE <schema>;` in the SQL overrides `schema`.
pub async fn explain<C: BackendConnector>(
    coordinator: &ExplainCoordinator<C>,
    sql: &str,
    schema: &str,
) -> Result<ExplainReport, OperationError> {
    let (sql, named) = extract_use(sql);
    let schema = named.unwrap_or_else(|| schema.to_string());

    let mut plan = coordinator.capture(&sql, &schema).await?;
    let tips = tips::analyze(&sql, Some(plan.as_mut_slice()));

    Ok(ExplainReport { sql, schema, tips, plan })
}
