//! Error taxonomy for explain requests and schema listings.
//!
//! Every stage converts its own failure into an [`OperationError`] before
//! returning, so callers only ever see one of four tagged outcomes.

use thiserror::Error;

/// Suffix that marks a public (read-only replica) schema name.
pub const PUBLIC_SCHEMA_SUFFIX: &str = "_p";

/// A failure reported by the backend or the connection pool.
///
/// `code` carries the server error number when the failure came from the
/// database itself (e.g. 1969 for an interrupted statement).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub code: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>())
            .map(|mysql| mysql.number());
        Self { code, message: err.to_string() }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    /// The statement conflicts with the capture protocol; no connection was opened.
    #[error("Query error: {0}")]
    Validation(String),

    #[error("USE error: {message}{}", public_schema_hint(.schema))]
    SchemaSelection { message: String, schema: String },

    /// The dispatched query failed for a reason other than the armed time limit.
    #[error("Query error: {0}")]
    QueryExecution(String),

    #[error(
        "SHOW EXPLAIN failed: {0} This may be a connection issue. \
         If you believe your query is valid, try resubmitting."
    )]
    ExplainCapture(String),
}

impl OperationError {
    pub fn schema_selection(err: impl std::fmt::Display, schema: &str) -> Self {
        Self::SchemaSelection { message: err.to_string(), schema: schema.to_string() }
    }

    pub fn explain_capture(err: impl std::fmt::Display) -> Self {
        let mut message = err.to_string();
        if !message.ends_with('.') {
            message.push('.');
        }
        Self::ExplainCapture(message)
    }

    /// Stable machine-readable tag used in tool responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::SchemaSelection { .. } => "schema_selection",
            Self::QueryExecution(_) => "query_execution",
            Self::ExplainCapture(_) => "explain_capture",
        }
    }
}

fn public_schema_hint(schema: &str) -> &'static str {
    if !schema.is_empty() && !schema.ends_with(PUBLIC_SCHEMA_SUFFIX) {
        "; Public database names should end with \"_p\""
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_selection_hint_for_non_public_name() {
        let err = OperationError::schema_selection("Unknown database 'enwiki'", "enwiki");
        assert_eq!(
            err.to_string(),
            "USE error: Unknown database 'enwiki'; Public database names should end with \"_p\""
        );
    }

    #[test]
    fn test_schema_selection_no_hint_for_public_name() {
        let err = OperationError::schema_selection("Access denied", "enwiki_p");
        assert_eq!(err.to_string(), "USE error: Access denied");
    }

    #[test]
    fn test_explain_capture_invites_resubmission() {
        let err = OperationError::explain_capture("Target is not running an EXPLAINable command");
        let msg = err.to_string();
        assert!(msg.starts_with("SHOW EXPLAIN failed: Target is not running an EXPLAINable command."));
        assert!(msg.ends_with("try resubmitting."));
        assert_eq!(err.kind(), "explain_capture");
    }

    #[test]
    fn test_validation_and_query_errors_share_prefix() {
        assert_eq!(OperationError::Validation("x".into()).to_string(), "Query error: x");
        assert_eq!(OperationError::QueryExecution("y".into()).to_string(), "Query error: y");
    }

    #[test]
    fn test_backend_error_display_is_message() {
        let err = BackendError::with_code(1969, "Query execution was interrupted");
        assert_eq!(err.code, Some(1969));
        assert_eq!(err.to_string(), "Query execution was interrupted");
    }
}
