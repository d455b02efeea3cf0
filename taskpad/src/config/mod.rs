//! Configuration system for the `Taskpad` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskpad/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::tasks::QueuePolicy;

/// Server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:9400/";

/// Errors that can occur when loading configuration.
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

    /// The server URL is not a valid absolute URL.
    #[error("invalid server url {value:?}: {source}")]
    InvalidUrl {
        /// The rejected value.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },

    /// No data directory was configured and none could be derived.
    #[error("could not determine data directory (set --data-dir or TASKPAD_DATA_DIR)")]
    NoDataDir,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    storage: StorageFileConfig,
    network: NetworkFileConfig,
    sync: SyncFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    url: Option<String>,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_dir: Option<PathBuf>,
}

/// `[network]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NetworkFileConfig {
    probe_timeout_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
}

/// `[sync]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SyncFileConfig {
    elide_unsynced_deletes: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of `taskpad-server`.
    pub server_url: Url,
    /// Directory holding the local key/value files and the session secret.
    pub data_dir: PathBuf,
    /// How long the connectivity probe waits for a TCP connect.
    pub probe_timeout: Duration,
    /// Per-request timeout for backend calls.
    pub request_timeout: Duration,
    /// Pending queue coalescing policy.
    pub queue_policy: QueuePolicy,
    /// Treat the network as unreachable regardless of the probe.
    pub offline: bool,
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. If no `--config` is given, the default path
    /// (`~/.config/taskpad/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, if the server URL is invalid, or if no data directory
    /// can be determined.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file, dirs::data_dir())
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. `platform_data_dir` is the base for
    /// the default data directory.
    fn resolve(
        cli: &CliArgs,
        file: &ConfigFile,
        platform_data_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let raw_url = cli
            .server_url
            .clone()
            .or_else(|| file.server.url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            value: raw_url.clone(),
            source,
        })?;

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| file.storage.data_dir.clone())
            .or_else(|| platform_data_dir.map(|d| d.join("taskpad")))
            .ok_or(ConfigError::NoDataDir)?;

        Ok(Self {
            server_url,
            data_dir,
            probe_timeout: file
                .network
                .probe_timeout_ms
                .map_or(Duration::from_millis(1500), Duration::from_millis),
            request_timeout: file
                .network
                .request_timeout_secs
                .map_or(Duration::from_secs(10), Duration::from_secs),
            queue_policy: QueuePolicy {
                elide_unsynced_deletes: file.sync.elide_unsynced_deletes.unwrap_or(false),
            },
            offline: cli.offline,
        })
    }

    /// Location of the session secret file.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session")
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Offline-first task list")]
pub struct CliArgs {
    /// Base URL of the taskpad server.
    #[arg(long = "server", env = "TASKPAD_SERVER")]
    pub server_url: Option<String>,

    /// Directory for local data (default: platform data dir + `taskpad`).
    #[arg(long, env = "TASKPAD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to config file (default: `~/.config/taskpad/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Behave as if the network were unreachable.
    #[arg(long)]
    pub offline: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKPAD_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskpad.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// What to do (default: `list`).
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// `taskpad` subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an account.
    SignUp {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "TASKPAD_PASSWORD")]
        password: String,
    },
    /// Sign in and remember the session.
    SignIn {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "TASKPAD_PASSWORD")]
        password: String,
    },
    /// Forget the session and the cached profile.
    SignOut,
    /// Show the signed-in user.
    Whoami,
    /// Show the task list.
    List {
        /// Only tasks with this status.
        #[arg(long)]
        status: Option<String>,
    },
    /// Add a task.
    Add {
        /// Task title.
        title: String,
        /// Longer description.
        #[arg(long, default_value = "")]
        description: String,
        /// Due date (ISO-8601; default: now).
        #[arg(long)]
        date: Option<String>,
        /// Initial status (default: `Pending`).
        #[arg(long)]
        status: Option<String>,
    },
    /// Change fields of a task.
    Edit {
        /// Task id.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New due date.
        #[arg(long)]
        date: Option<String>,
        /// New status.
        #[arg(long)]
        status: Option<String>,
    },
    /// Mark a task completed.
    Complete {
        /// Task id.
        id: String,
    },
    /// Delete a task.
    Delete {
        /// Task id.
        id: String,
    },
    /// Load from the server, replaying queued changes first.
    Sync,
    /// Upload the whole local list in one batch.
    Push,
    /// Show queued changes.
    Pending,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskpad").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
