use std::sync::Arc;
use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    model::{
        ServerInfo, ServerCapabilities, Implementation, ProtocolVersion,
        ListToolsResult, CallToolResult, CallToolRequestParams,
        Tool, PaginatedRequestParams,
        ErrorCode,
    },
    service::RequestContext,
    RoleServer,
    ErrorData as McpError,
    transport::stdio,
};

use crate::config::Config;
use crate::db::MySqlConnector;
use crate::explain::{CaptureSettings, ExplainCoordinator};

pub(crate) mod error;
mod handlers;
mod tool_schemas;

use tool_schemas::*;

const EXPLAIN_QUERY_DESCRIPTION: &str = concat!(
    "Show the execution plan of a SELECT query as the replica runs it, with optimization tips. ",
    "The query is started with a one-second time limit and its live plan is captured, so it ",
    "does not have to finish. Returns sql, schema, plan (one row per table access: ",
    "id, select_type, table, type, possible_keys, key, key_len, ref, rows, Extra) and tips ",
    "(specific: companion-view suggestions, keyed '0'; general: plan warnings keyed by row ",
    "position, and query-wide advice keyed by '*'). ",
    "A leading 'USE <schema>;' overrides the schema argument.",
);

pub struct McpServer {
    pub config: Arc<Config>,
    connector: MySqlConnector,
    coordinator: ExplainCoordinator<MySqlConnector>,
}

impl McpServer {
    pub fn new(config: Arc<Config>) -> Self {
        let connector = MySqlConnector::new(config.clone());
        let coordinator = ExplainCoordinator::new(
            connector.clone(),
            CaptureSettings::from(&config.explain),
        );
        Self { config, connector, coordinator }
    }

    pub async fn run(self) -> Result<()> {
        let service = self.serve(stdio()).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Schema named by the request, or the configured default.
    fn schema_arg(&self, args: &serde_json::Map<String, serde_json::Value>) -> String {
        args.get("schema")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.config.connection.default_schema)
            .to_string()
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "sql-optimizer-mcp".to_string(),
                title: Some("SQL Optimizer MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "Capture live MariaDB execution plans for SELECT queries and suggest optimizations".to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Use explain_query to see how the replica executes a SELECT and get tips for making it faster. \
                 Use list_tables and describe_table to look up table and column names."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = vec![
                Tool::new(
                    "explain_query",
                    EXPLAIN_QUERY_DESCRIPTION,
                    explain_query_schema(),
                ),
                Tool::new(
                    "list_tables",
                    "List the tables and views of a schema.",
                    list_tables_schema(),
                ),
                Tool::new(
                    "describe_table",
                    "Describe the columns of a table: Field, Type, Null, Key, Default, Extra.",
                    describe_table_schema(),
                ),
            ];

            Ok(ListToolsResult {
                meta: None,
                tools,
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let args = request.arguments.unwrap_or_default();
            match request.name.as_ref() {
                "explain_query"  => self.handle_explain_query(args).await,
                "list_tables"    => self.handle_list_tables(args).await,
                "describe_table" => self.handle_describe_table(args).await,
                name => Err(McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("Unknown tool: {}", name),
                    None,
                )),
            }
        }
    }
}
