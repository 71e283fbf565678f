use crate::core::db::Credentials;
use crate::core::{EzsqlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
}

/// Server address, login and the database to select after connecting.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: Option<String>,
}

/// Logging-related configuration.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, e.g. "ezsql=debug"
    pub filter: Option<String>,
}

impl From<&ServerConfig> for Credentials {
    fn from(config: &ServerConfig) -> Self {
        Credentials::new(config.host.clone(), config.user.clone(), config.password.clone())
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = ezsql::config::load_config("config.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| EzsqlError::Config(e.to_string()))
}

/// `<config dir>/ezsql/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ezsql").join("config.toml"))
}
