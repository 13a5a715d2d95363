//! MySQL/MariaDB implementation of the explain backend.
//!
//! Every statement goes over the text protocol (`sqlx::raw_sql`): `USE` and
//! `SHOW EXPLAIN` cannot be prepared, and user SQL must reach the server verbatim.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlSslMode};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, Executor};

use crate::config::Config;
use crate::error::BackendError;
use crate::explain::plan::decode_plan;
use crate::explain::{BackendConnector, BackendSession, ExplainBackend, PlanRow, SessionIdentity};
use crate::schema::fetch::{escape_mysql_identifier, is_col_str, is_col_u64};

/// Opens request-scoped pools against the host serving a schema.
#[derive(Clone)]
pub struct MySqlConnector {
    config: Arc<Config>,
}

impl MySqlConnector {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Build a lazily connecting pool for `schema`. No connection is opened
    /// until the first acquire.
    pub fn open_pool(&self, schema: &str) -> MySqlPool {
        let opts = build_connect_options(&self.config, schema);
        MySqlPoolOptions::new()
            .max_connections(self.config.pool.max_connections)
            .acquire_timeout(Duration::from_millis(self.config.pool.connect_timeout_ms))
            .idle_timeout(Duration::from_secs(300))
            .connect_lazy_with(opts)
    }
}

impl BackendConnector for MySqlConnector {
    type Backend = MySqlBackend;

    fn open(&self, schema: &str) -> Result<MySqlBackend, BackendError> {
        Ok(MySqlBackend { pool: self.open_pool(schema) })
    }
}

pub struct MySqlBackend {
    pool: MySqlPool,
}

#[async_trait]
impl ExplainBackend for MySqlBackend {
    type Session = MySqlSession;

    async fn acquire(&self) -> Result<MySqlSession, BackendError> {
        let conn = self.pool.acquire().await?;
        Ok(MySqlSession { conn })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct MySqlSession {
    conn: PoolConnection<MySql>,
}

#[async_trait]
impl BackendSession for MySqlSession {
    async fn use_schema(&mut self, schema: &str) -> Result<(), BackendError> {
        let sql = format!("USE `{}`", escape_mysql_identifier(schema));
        let conn: &mut MySqlConnection = &mut self.conn;
        conn.execute(sqlx::raw_sql(&sql)).await?;
        Ok(())
    }

    async fn identify(&mut self) -> Result<SessionIdentity, BackendError> {
        let conn: &mut MySqlConnection = &mut self.conn;
        let row = conn
            .fetch_one(sqlx::raw_sql("SELECT @@GLOBAL.hostname AS hostname, CONNECTION_ID() AS thread_id"))
            .await?;
        let thread_id = is_col_u64(&row, "thread_id")
            .ok_or_else(|| BackendError::new("CONNECTION_ID() returned no value"))?;
        Ok(SessionIdentity {
            instance: is_col_str(&row, "hostname"),
            thread_id,
        })
    }

    async fn arm_statement_time(&mut self, limit: Duration) -> Result<(), BackendError> {
        let sql = format!("SET max_statement_time = {}", limit.as_secs().max(1));
        let conn: &mut MySqlConnection = &mut self.conn;
        conn.execute(sqlx::raw_sql(&sql)).await?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), BackendError> {
        let conn: &mut MySqlConnection = &mut self.conn;
        conn.execute(sqlx::raw_sql(sql)).await?;
        Ok(())
    }

    async fn show_explain(&mut self, thread_id: u64) -> Result<Vec<PlanRow>, BackendError> {
        let sql = format!("SHOW EXPLAIN FOR {}", thread_id);
        let conn: &mut MySqlConnection = &mut self.conn;
        let rows = conn.fetch_all(sqlx::raw_sql(&sql)).await?;
        Ok(decode_plan(&rows))
    }

    async fn discard(self) -> Result<(), BackendError> {
        self.conn.detach().close().await?;
        Ok(())
    }
}

fn build_connect_options(config: &Config, schema: &str) -> MySqlConnectOptions {
    let conn = &config.connection;

    // ssl_ca without ssl_accept_invalid_certs verifies the chain but not the
    // hostname: replica certs are issued for the service name, not the shard alias.
    let ssl_mode = match (config.security.ssl, config.security.ssl_accept_invalid_certs, config.security.ssl_ca.is_some()) {
        (false, _, _)        => MySqlSslMode::Disabled,
        (true, true, _)      => MySqlSslMode::Required,
        (true, false, true)  => MySqlSslMode::VerifyCa,
        (true, false, false) => MySqlSslMode::VerifyIdentity,
    };
    // The schema is selected with an explicit USE so its failure can be reported
    // on its own.
    let mut opts = MySqlConnectOptions::new()
        .host(&conn.host_for(schema))
        .port(conn.port)
        .username(&conn.user)
        .password(&conn.password)
        .ssl_mode(ssl_mode);
    if let Some(ca_path) = &config.security.ssl_ca {
        opts = opts.ssl_ca(ca_path);
    }
    opts
}
