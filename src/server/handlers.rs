use rmcp::model::CallToolResult;
use serde_json::json;

use crate::error::OperationError;
use crate::explain;
use crate::schema;
use crate::tool_error;

use super::error::operation_error_response;
use super::tool_schemas::serialize_response;
use super::McpServer;

/// Maximum SQL statement length (1 MB).
const MAX_SQL_LEN: usize = 1_000_000;

type ToolResult = Result<CallToolResult, rmcp::ErrorData>;

impl McpServer {
    pub(crate) async fn handle_explain_query(
        &self,
        args: serde_json::Map<String, serde_json::Value>,
    ) -> ToolResult {
        let sql = match args.get("sql").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => return tool_error!("Missing required parameter: sql"),
        };
        if sql.len() > MAX_SQL_LEN {
            return tool_error!("SQL too large: {} bytes (max {} bytes / 1 MB)", sql.len(), MAX_SQL_LEN);
        }
        let schema = self.schema_arg(&args);

        match explain::explain(&self.coordinator, &sql, &schema).await {
            Ok(report) => Ok(serialize_response(&report)),
            Err(e) => Ok(self.reject("explain_query", &schema, e)),
        }
    }

    pub(crate) async fn handle_list_tables(
        &self,
        args: serde_json::Map<String, serde_json::Value>,
    ) -> ToolResult {
        let schema = self.schema_arg(&args);
        match schema::list_tables(&self.connector, &schema).await {
            Ok(tables) => Ok(serialize_response(&json!({
                "schema": schema,
                "tables": tables,
            }))),
            Err(e) => Ok(self.reject("list_tables", &schema, e)),
        }
    }

    pub(crate) async fn handle_describe_table(
        &self,
        args: serde_json::Map<String, serde_json::Value>,
    ) -> ToolResult {
        let table = match args.get("table").and_then(|v| v.as_str()) {
            Some(t) => t.to_string(),
            None => return tool_error!("Missing required parameter: table"),
        };
        let schema = self.schema_arg(&args);
        match schema::describe_table(&self.connector, &schema, &table).await {
            Ok(columns) => Ok(serialize_response(&json!({
                "schema": schema,
                "table": table,
                "columns": columns,
            }))),
            Err(e) => Ok(self.reject("describe_table", &schema, e)),
        }
    }

    fn reject(&self, tool: &str, schema: &str, err: OperationError) -> CallToolResult {
        tracing::info!(tool, schema, kind = err.kind(), "Request failed: {}", err);
        operation_error_response(&err)
    }
}
