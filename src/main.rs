use std::sync::Arc;
use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sql_optimizer_mcp::{config, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration comes first so monitoring.log_level can seed the filter.
    let raw_config = config::merge::load_config()?;

    // Logs MUST go to stderr: stdout is the MCP JSON-RPC transport.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&raw_config.monitoring.log_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    info!("sql-optimizer-mcp starting");

    raw_config.validate()?;
    let config = Arc::new(raw_config);
    info!(
        host = %config.connection.host,
        default_schema = %config.connection.default_schema,
        statement_time_secs = config.explain.statement_time_secs,
        capture_delay_ms = config.explain.capture_delay_ms,
        "Configuration loaded"
    );

    // Pools are opened per request, so nothing connects until the first tool call
    let mcp_server = server::McpServer::new(config);
    info!("MCP server starting on stdio");
    mcp_server.run().await?;

    Ok(())
}
