use std::sync::Arc;
use crate::config::Config;
use crate::db::MySqlConnector;
use testcontainers_modules::{
    mariadb::Mariadb,
    testcontainers::{runners::AsyncRunner, ContainerAsync},
};

/// Holds a fixture pool, the config that reaches the same server, and
/// optionally the container keeping it alive. Dropping this value tears down
/// the container.
pub struct TestDb {
    /// Connected to `config.connection.default_schema`; used to create fixtures.
    pub pool: sqlx::MySqlPool,
    pub config: Arc<Config>,
    _container: Option<ContainerAsync<Mariadb>>,
}

impl TestDb {
    pub fn connector(&self) -> MySqlConnector {
        MySqlConnector::new(self.config.clone())
    }

    pub fn schema(&self) -> &str {
        &self.config.connection.default_schema
    }
}

/// Set up a MariaDB for integration tests, or `None` to skip them.
///
/// - If `MYSQL_HOST` is set, uses the env-var config (same path as `main`).
/// - Otherwise starts a throwaway MariaDB container (requires Docker). `SHOW
///   EXPLAIN` is MariaDB-only, so a MySQL image would not do.
pub async fn setup_test_db() -> Option<TestDb> {
    if std::env::var("MYSQL_HOST").is_ok() {
        let config = match crate::config::merge::load_config() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Skipping integration test: {e}");
                return None;
            }
        };
        let pool = fixture_pool(&config).await?;
        return Some(TestDb { pool, config: Arc::new(config), _container: None });
    }

    let container = match Mariadb::default().start().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Skipping integration test: no MYSQL_HOST and no Docker ({e})");
            return None;
        }
    };
    let host = container.get_host().await.ok()?.to_string();
    let port = container.get_host_port_ipv4(3306).await.ok()?;

    let mut config = Config::default();
    config.connection.host = host;
    config.connection.port = port;
    config.connection.user = "root".to_string();
    config.connection.password = String::new();
    // MARIADB_DATABASE=test in the module's defaults
    config.connection.default_schema = "test".to_string();

    let pool = fixture_pool(&config).await?;
    Some(TestDb { pool, config: Arc::new(config), _container: Some(container) })
}

async fn fixture_pool(config: &Config) -> Option<sqlx::MySqlPool> {
    use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
    let opts = MySqlConnectOptions::new()
        .host(&config.connection.host_for(&config.connection.default_schema))
        .port(config.connection.port)
        .username(&config.connection.user)
        .password(&config.connection.password)
        .database(&config.connection.default_schema)
        .ssl_mode(MySqlSslMode::Preferred);

    match MySqlPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(opts)
        .await
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            eprintln!("Skipping integration test: cannot connect ({e})");
            None
        }
    }
}
