use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::{debug, info};

use super::runtime::AppConfig;

/// Environment variable prefix, e.g. `JACKPOT__SIMULATION__BET_UNIT=20`
pub const ENV_PREFIX: &str = "JACKPOT";

/// Layered configuration: defaults, then the optional TOML file, then
/// `JACKPOT__*` environment variables
pub fn load_config(path: &str) -> Result<AppConfig> {
    if let Ok(env_file) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", env_file.display());
    }

    let defaults = toml::to_string(&AppConfig::default()).context("serializing default config")?;

    let settings = Config::builder()
        .add_source(File::from_str(&defaults, FileFormat::Toml))
        .add_source(File::new(path, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("reading configuration from {}", path))?;

    let config: AppConfig = settings
        .try_deserialize()
        .context("invalid configuration values")?;

    config
        .validate()
        .map_err(|errors| anyhow!("invalid configuration: {}", errors.join(", ")))?;

    if Path::new(path).is_file() {
        info!("Configuration loaded from {}", path);
    }
    Ok(config)
}

/// Write the default configuration as TOML
pub fn write_default_config(path: &str) -> Result<()> {
    let text = toml::to_string_pretty(&AppConfig::default()).context("serializing default config")?;
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text).with_context(|| format!("writing {}", path))?;
    info!("Default configuration written to {}", path);
    Ok(())
}
