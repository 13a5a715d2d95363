use crate::config::Config;

// eprintln! here: this runs before the logging system starts.

fn parse_env_num<T: std::str::FromStr>(key: &str) -> Option<T> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => match v.parse::<T>() {
            Ok(n) => Some(n),
            Err(_) => {
                eprintln!(
                    "Warning: {} is set to {:?} but could not be parsed as a number; using default",
                    key, v
                );
                None
            }
        },
        _ => None,
    }
}

fn parse_bool_env(key: &str) -> Option<bool> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => match v.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => {
                eprintln!(
                    "Warning: {} is set to {:?} but is not a recognized boolean \
                     (true/false/1/0/yes/no); using default",
                    key, v
                );
                None
            }
        },
        _ => None,
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read every supported environment variable. Unset variables stay `None`.
pub fn load_env_config() -> EnvConfig {
    EnvConfig {
        host: non_empty_env("MYSQL_HOST"),
        port: parse_env_num::<u16>("MYSQL_PORT"),
        user: non_empty_env("MYSQL_USER"),
        // An empty password is a legitimate override
        password: std::env::var("MYSQL_PASS").ok(),
        default_schema: non_empty_env("MYSQL_DB"),
        pool_size: parse_env_num::<u32>("MYSQL_POOL_SIZE"),
        connect_timeout_ms: parse_env_num::<u64>("MYSQL_CONNECT_TIMEOUT"),
        ssl: parse_bool_env("MYSQL_SSL"),
        ssl_accept_invalid_certs: parse_bool_env("MYSQL_SSL_ACCEPT_INVALID_CERTS"),
        ssl_ca: non_empty_env("MYSQL_SSL_CA"),
        statement_time_secs: parse_env_num::<u64>("EXPLAIN_STATEMENT_TIME"),
        capture_delay_ms: parse_env_num::<u64>("EXPLAIN_CAPTURE_DELAY_MS"),
        max_affinity_retries: parse_env_num::<u32>("EXPLAIN_MAX_AFFINITY_RETRIES"),
        log_level: non_empty_env("LOG_LEVEL"),
    }
}

/// All env var overrides (None = not set, don't override).
#[derive(Debug, Default)]
pub struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub default_schema: Option<String>,
    pub pool_size: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub ssl: Option<bool>,
    pub ssl_accept_invalid_certs: Option<bool>,
    pub ssl_ca: Option<String>,
    pub statement_time_secs: Option<u64>,
    pub capture_delay_ms: Option<u64>,
    pub max_affinity_retries: Option<u32>,
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Apply env var overrides onto a base Config, returning the merged result.
    pub fn apply_to(self, mut base: Config) -> Config {
        if let Some(v) = self.host {
            base.connection.host = v;
        }
        if let Some(v) = self.port {
            base.connection.port = v;
        }
        if let Some(v) = self.user {
            base.connection.user = v;
        }
        if let Some(v) = self.password {
            base.connection.password = v;
        }
        if let Some(v) = self.default_schema {
            base.connection.default_schema = v;
        }
        if let Some(v) = self.pool_size {
            base.pool.max_connections = v;
        }
        if let Some(v) = self.connect_timeout_ms {
            base.pool.connect_timeout_ms = v;
        }
        if let Some(v) = self.ssl {
            base.security.ssl = v;
        }
        if let Some(v) = self.ssl_accept_invalid_certs {
            base.security.ssl_accept_invalid_certs = v;
        }
        if let Some(v) = self.ssl_ca {
            base.security.ssl_ca = Some(v);
        }
        if let Some(v) = self.statement_time_secs {
            base.explain.statement_time_secs = v;
        }
        if let Some(v) = self.capture_delay_ms {
            base.explain.capture_delay_ms = v;
        }
        if let Some(v) = self.max_affinity_retries {
            base.explain.max_affinity_retries = v;
        }
        if let Some(v) = self.log_level {
            base.monitoring.log_level = v;
        }
        base
    }
}
