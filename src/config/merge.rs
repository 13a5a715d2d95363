use anyhow::Result;
use crate::config::Config;
use crate::config::toml_config::load_default_config;
use crate::config::env_config::load_env_config;

/// Load the final merged config:
/// 1. Load dotenv if .env exists
/// 2. Load TOML base config
/// 3. Apply env var overrides onto it
pub fn load_config() -> Result<Config> {
    if std::path::Path::new(".env").exists() {
        dotenv::dotenv().ok();
    }

    let base = load_default_config()?;
    let env = load_env_config();
    Ok(env.apply_to(base))
}
