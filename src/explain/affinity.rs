use crate::error::OperationError;

use super::backend::{BackendSession, ExplainBackend};

/// Acquire a connection routed to the same server as `target`.
///
/// Behind a load balancer a fresh pooled connection may land on any replica,
/// and `SHOW EXPLAIN` only sees threads of its own server. Candidates on the
/// wrong server are closed (not returned to the pool) so that the next attempt
/// opens a new physical connection.
pub async fn resolve<B: ExplainBackend>(
    backend: &B,
    target: &str,
    max_attempts: u32,
) -> Result<B::Session, OperationError> {
    for attempt in 1..=max_attempts {
        let mut candidate = backend.acquire().await.map_err(OperationError::explain_capture)?;

        match candidate.identify().await {
            Ok(identity) if identity.instance == target => {
                tracing::info!(attempt, instance = %identity.instance, "Explain connection established");
                return Ok(candidate);
            }
            Ok(identity) => {
                tracing::debug!(
                    attempt,
                    max_attempts,
                    instance = %identity.instance,
                    wanted = %target,
                    "Explain connection landed on another server, retrying"
                );
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Could not identify explain connection, retrying");
            }
        }

        if let Err(e) = candidate.discard().await {
            tracing::debug!(error = %e, "Closing mismatched explain connection failed");
        }
    }

    Err(OperationError::explain_capture(format!(
        "Unable to establish a connection after {} tries.",
        max_attempts
    )))
}
