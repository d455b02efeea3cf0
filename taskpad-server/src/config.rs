//! Configuration system for `taskpad-server`.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskpad-server/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;

use crate::store::DEFAULT_MIN_PASSWORD_LEN;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the server.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerFileConfig,
    auth: AuthFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
}

/// `[auth]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    min_password_len: Option<usize>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskpad development backend")]
pub struct ServerCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "TASKPAD_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/taskpad-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Minimum accepted password length.
    #[arg(long)]
    pub min_password_len: Option<usize>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKPAD_SERVER_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:9400`).
    pub bind_addr: String,
    /// Minimum accepted password length in characters.
    pub min_password_len: usize,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9400".to_string(),
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &ServerCliArgs, file: &ServerConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            min_password_len: cli
                .min_password_len
                .or(file.auth.min_password_len)
                .unwrap_or(defaults.min_password_len),
            log_level: cli.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the server.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<ServerConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ServerConfigFile::default());
        };
        config_dir.join("taskpad-server").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
