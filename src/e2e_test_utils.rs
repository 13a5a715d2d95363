//! Shared helpers for E2E tests that spawn the sql-optimizer-mcp binary over stdio.
//! All items are `pub(crate)` so they can be used from any `#[cfg(test)]` module.

use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::config::Config;

pub(crate) fn binary_path() -> Option<std::path::PathBuf> {
    // Most recently built profile wins, so a stale release build is not used
    // after `cargo test` rebuilt debug (or the reverse).
    ["./target/release/sql-optimizer-mcp", "./target/debug/sql-optimizer-mcp"]
        .iter()
        .filter_map(|p| {
            let path = std::path::Path::new(p);
            path.metadata().ok().map(|m| (path.to_path_buf(), m))
        })
        .max_by_key(|(_, m)| m.modified().ok())
        .map(|(p, _)| p)
}

pub(crate) async fn send_message(stdin: &mut tokio::process::ChildStdin, msg: &Value) {
    let line = format!("{}\n", serde_json::to_string(msg).unwrap());
    stdin.write_all(line.as_bytes()).await.unwrap();
    stdin.flush().await.unwrap();
}

pub(crate) async fn read_response(
    reader: &mut BufReader<tokio::process::ChildStdout>,
) -> Option<Value> {
    let mut line = String::new();
    // An explain holds the request for at least the capture delay plus the
    // statement time; 45s leaves room for slow container startup.
    match tokio::time::timeout(Duration::from_secs(45), reader.read_line(&mut line)).await {
        Ok(Ok(n)) if n > 0 => serde_json::from_str(line.trim()).ok(),
        _ => None,
    }
}

/// Spawns the binary configured to reach the server described by `config`.
/// `extra_env` is applied after the connection variables.
pub(crate) fn spawn_server(
    binary: &std::path::Path,
    config: &Config,
    extra_env: &[(&str, &str)],
) -> Option<tokio::process::Child> {
    let mut cmd = Command::new(binary);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        // Keep a developer's sql-optimizer.toml out of the picture
        .env("SQL_OPTIMIZER_CONFIG", "/nonexistent/sql-optimizer.toml")
        .env("MYSQL_HOST", &config.connection.host)
        .env("MYSQL_PORT", config.connection.port.to_string())
        .env("MYSQL_USER", &config.connection.user)
        .env("MYSQL_PASS", &config.connection.password)
        .env("MYSQL_DB", &config.connection.default_schema)
        .env("MYSQL_SSL", if config.security.ssl { "true" } else { "false" })
        .env(
            "MYSQL_SSL_ACCEPT_INVALID_CERTS",
            if config.security.ssl_accept_invalid_certs { "true" } else { "false" },
        )
        .env("MYSQL_CONNECT_TIMEOUT", "30000");
    if let Some(ca) = config.security.ssl_ca.as_deref().filter(|s| !s.is_empty()) {
        cmd.env("MYSQL_SSL_CA", ca);
    }
    for (k, v) in extra_env {
        cmd.env(k, v);
    }
    match cmd.spawn() {
        Ok(child) => Some(child),
        Err(e) => {
            eprintln!("Skipping E2E: failed to spawn {}: {}", binary.display(), e);
            None
        }
    }
}

/// Extract stdin and stdout from a freshly spawned child process.
/// Panics if the child was not spawned with piped stdin/stdout.
pub(crate) fn setup_io(
    child: &mut tokio::process::Child,
) -> (
    tokio::process::ChildStdin,
    BufReader<tokio::process::ChildStdout>,
) {
    let stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    (stdin, BufReader::new(stdout))
}

/// Standard initialize + notifications/initialized handshake so subsequent
/// tool calls are accepted by the server.
pub(crate) async fn do_handshake(
    stdin: &mut tokio::process::ChildStdin,
    reader: &mut BufReader<tokio::process::ChildStdout>,
) {
    send_message(
        stdin,
        &json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "1"}
            }
        }),
    )
    .await;
    let _ = read_response(reader).await; // consume initialize response
    send_message(
        stdin,
        &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
}

/// Call one tool and return its `result` object.
pub(crate) async fn call_tool(
    stdin: &mut tokio::process::ChildStdin,
    reader: &mut BufReader<tokio::process::ChildStdout>,
    id: u64,
    name: &str,
    arguments: Value,
) -> Option<Value> {
    send_message(
        stdin,
        &json!({
            "jsonrpc": "2.0", "id": id, "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        }),
    )
    .await;
    read_response(reader).await.map(|resp| resp["result"].clone())
}
