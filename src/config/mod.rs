use serde::{Deserialize, Serialize};

pub mod env_config;
pub mod merge;
pub mod toml_config;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub pool: PoolConfig,
    pub security: SecurityConfig,
    pub explain: ExplainConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server host. A `*` is replaced by the requested schema name without its
    /// `_p` suffix, e.g. `*.analytics.db.svc.wikimedia.cloud`.
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Schema used when a request does not name one.
    pub default_schema: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Upper bound for each request-scoped pool (primary + explain candidate).
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub ssl: bool,
    pub ssl_accept_invalid_certs: bool,
    /// Path to a PEM CA bundle for SSL verification (optional).
    pub ssl_ca: Option<String>,
}

/// Timing of the live-plan capture. The capture delay must stay below the
/// statement time so the query is (usually) still running when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub statement_time_secs: u64,
    pub capture_delay_ms: u64,
    pub max_affinity_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            default_schema: "enwiki_p".to_string(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 4,
            connect_timeout_ms: 10_000,
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            statement_time_secs: 1,
            capture_delay_ms: 500,
            max_affinity_retries: 100,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Host serving `schema`: `*` in the configured host becomes the schema
    /// name with any `_p` suffix removed.
    pub fn host_for(&self, schema: &str) -> String {
        let shard = schema.strip_suffix(crate::error::PUBLIC_SCHEMA_SUFFIX).unwrap_or(schema);
        self.host.replace('*', shard)
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        // One primary plus at least one explain candidate per request
        if self.pool.max_connections < 2 {
            anyhow::bail!(
                "Config error: MYSQL_POOL_SIZE must be at least 2 (got {})",
                self.pool.max_connections
            );
        }
        if self.pool.max_connections > 100 {
            anyhow::bail!(
                "Config error: MYSQL_POOL_SIZE unreasonably large: {} (max 100)",
                self.pool.max_connections
            );
        }

        if self.pool.connect_timeout_ms < 100 {
            anyhow::bail!(
                "Config error: MYSQL_CONNECT_TIMEOUT must be at least 100ms (got {}ms)",
                self.pool.connect_timeout_ms
            );
        }

        if self.explain.statement_time_secs == 0 {
            anyhow::bail!("Config error: EXPLAIN_STATEMENT_TIME must be at least 1 second");
        }
        if self.explain.capture_delay_ms >= self.explain.statement_time_secs.saturating_mul(1000) {
            anyhow::bail!(
                "Config error: EXPLAIN_CAPTURE_DELAY_MS ({}ms) must be shorter than \
                 EXPLAIN_STATEMENT_TIME ({}s) or the query is gone before the capture",
                self.explain.capture_delay_ms,
                self.explain.statement_time_secs
            );
        }
        if self.explain.max_affinity_retries == 0 {
            anyhow::bail!("Config error: EXPLAIN_MAX_AFFINITY_RETRIES must be >= 1");
        }

        if self.connection.default_schema.trim().is_empty() {
            anyhow::bail!("Config error: MYSQL_DB (default schema) cannot be empty");
        }

        Ok(())
    }
}
