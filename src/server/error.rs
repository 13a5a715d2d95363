//! Tool error responses. Server and driver errors can name replica addresses
//! and local files, which are redacted before they reach the client.

use std::sync::LazyLock;

use regex::Regex;
use rmcp::model::{CallToolResult, Content};

use crate::error::OperationError;

const REDACTED: &str = "[REDACTED]";

/// Applied in order: paths before addresses, since a path can hold an
/// address-like segment, and `ip:port` before a bare ip.
static REDACTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/[\w./-]+/[\w./-]+",
        r"[A-Za-z]:\\[\w.\\/-]+",
        r"\b\d{1,3}(?:\.\d{1,3}){3}(?::\d{1,5})?\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static OS_ERROR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(os error \d+\)").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub(crate) fn sanitize_error(error: &str) -> String {
    tracing::debug!("Unsanitized tool error: {}", error);

    let mut text = OS_ERROR.replace_all(error, "").into_owned();
    for pattern in REDACTIONS.iter() {
        text = pattern.replace_all(&text, REDACTED).into_owned();
    }
    WHITESPACE_RUN
        .replace_all(&text, " ")
        .trim()
        .trim_end_matches([':', ','])
        .to_string()
}

pub(crate) fn error_response(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(sanitize_error(&message.into()))])
}

/// Tool error for a failed explain or listing request. The text is the
/// error's display form, which is what users see in the editor.
pub(crate) fn operation_error_response(err: &OperationError) -> CallToolResult {
    error_response(err.to_string())
}

/// `Ok(error_response(..))` for handlers, with `format!` arguments.
///
/// ```ignore
/// tool_error!("SQL too large: {} bytes", sql.len());
/// ```
#[macro_export]
macro_rules! tool_error {
    ($msg:expr) => {
        Ok($crate::server::error::error_response($msg))
    };
    ($fmt:expr, $($arg:expr),+ $(,)?) => {
        Ok($crate::server::error::error_response(format!($fmt, $($arg),+)))
    };
}
