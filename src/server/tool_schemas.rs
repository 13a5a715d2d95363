use rmcp::model::Content;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn explain_query_schema() -> Arc<serde_json::Map<String, serde_json::Value>> {
    Arc::new(rmcp::model::object(json!({
        "type": "object",
        "properties": {
            "sql": {
                "type": "string",
                "description": "The SELECT query to explain. Statements that set max_statement_time are rejected."
            },
            "schema": {
                "type": "string",
                "description": "Database to run the query in, e.g. 'enwiki_p' (optional, defaults to the configured database)"
            }
        },
        "required": ["sql"]
    })))
}

pub(crate) fn list_tables_schema() -> Arc<serde_json::Map<String, serde_json::Value>> {
    Arc::new(rmcp::model::object(json!({
        "type": "object",
        "properties": {
            "schema": {
                "type": "string",
                "description": "Database to list tables from (optional, defaults to the configured database)"
            }
        },
        "required": []
    })))
}

pub(crate) fn describe_table_schema() -> Arc<serde_json::Map<String, serde_json::Value>> {
    Arc::new(rmcp::model::object(json!({
        "type": "object",
        "properties": {
            "table": { "type": "string", "description": "Table or view name" },
            "schema": {
                "type": "string",
                "description": "Database containing the table (optional, defaults to the configured database)"
            }
        },
        "required": ["table"]
    })))
}

/// Serialize a value to pretty-printed JSON and wrap it in a successful CallToolResult.
/// Returns a CallToolResult::error on serialization failure.
pub(crate) fn serialize_response<T: Serialize + ?Sized>(value: &T) -> rmcp::model::CallToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(s) => rmcp::model::CallToolResult::success(vec![Content::text(s)]),
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            rmcp::model::CallToolResult::error(vec![Content::text(format!(
                "Internal error: failed to serialize response: {}",
                e
            ))])
        }
    }
}
