//! Configuration for the `aichat` client.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/aichat/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that doesn't exist is.

use std::path::PathBuf;
use std::time::Duration;

use crate::history::{PagerConfig, SimulatedHistory};
use crate::services::auth::{self, SimulatedAuth};
use crate::services::countries::{
    self, AnyCountryDirectory, CountryError, HttpCountryDirectory, StaticCountryDirectory,
};
use crate::services::responder::{self, SimulatedResponder};

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
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    auth: AuthFileConfig,
    responder: ResponderFileConfig,
    history: HistoryFileConfig,
    countries: CountriesFileConfig,
}

/// `[storage]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    path: Option<PathBuf>,
    ephemeral: Option<bool>,
}

/// `[auth]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    send_delay_ms: Option<u64>,
    verify_delay_ms: Option<u64>,
}

/// `[responder]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ResponderFileConfig {
    min_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

/// `[history]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct HistoryFileConfig {
    page_size: Option<usize>,
    max_pages: Option<usize>,
    load_delay_ms: Option<u64>,
}

/// `[countries]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct CountriesFileConfig {
    endpoint: Option<String>,
    offline: Option<bool>,
    timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // -- Storage --
    /// Snapshot file; `None` means the platform default location.
    pub storage_path: Option<PathBuf>,
    /// Keep state in memory only.
    pub ephemeral: bool,

    // -- Auth --
    /// Simulated OTP send latency.
    pub auth_send_delay: Duration,
    /// Simulated OTP check latency.
    pub auth_verify_delay: Duration,

    // -- Responder --
    /// Lower bound of the simulated reply latency.
    pub responder_min_delay: Duration,
    /// Upper bound of the simulated reply latency.
    pub responder_max_delay: Duration,

    // -- History --
    /// Page size, page limit and load latency.
    pub history: PagerConfig,

    // -- Countries --
    /// Country list endpoint.
    pub countries_endpoint: String,
    /// Use the built-in list instead of the network.
    pub countries_offline: bool,
    /// Request timeout for the country list.
    pub countries_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            ephemeral: false,
            auth_send_delay: auth::SEND_DELAY,
            auth_verify_delay: auth::VERIFY_DELAY,
            responder_min_delay: responder::MIN_DELAY,
            responder_max_delay: responder::MAX_DELAY,
            history: PagerConfig::default(),
            countries_endpoint: countries::DEFAULT_ENDPOINT.to_string(),
            countries_offline: false,
            countries_timeout: countries::DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve from CLI args and a parsed config file. CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            storage_path: cli
                .storage
                .clone()
                .or_else(|| file.storage.path.clone()),
            ephemeral: cli.ephemeral || file.storage.ephemeral.unwrap_or(defaults.ephemeral),
            auth_send_delay: file
                .auth
                .send_delay_ms
                .map_or(defaults.auth_send_delay, Duration::from_millis),
            auth_verify_delay: file
                .auth
                .verify_delay_ms
                .map_or(defaults.auth_verify_delay, Duration::from_millis),
            responder_min_delay: file
                .responder
                .min_delay_ms
                .map_or(defaults.responder_min_delay, Duration::from_millis),
            responder_max_delay: file
                .responder
                .max_delay_ms
                .map_or(defaults.responder_max_delay, Duration::from_millis),
            history: PagerConfig {
                page_size: file
                    .history
                    .page_size
                    .unwrap_or(defaults.history.page_size),
                max_pages: file
                    .history
                    .max_pages
                    .unwrap_or(defaults.history.max_pages),
                load_delay: file
                    .history
                    .load_delay_ms
                    .map_or(defaults.history.load_delay, Duration::from_millis),
            },
            countries_endpoint: file
                .countries
                .endpoint
                .clone()
                .unwrap_or(defaults.countries_endpoint),
            countries_offline: cli.offline
                || file
                    .countries
                    .offline
                    .unwrap_or(defaults.countries_offline),
            countries_timeout: file
                .countries
                .timeout_secs
                .map_or(defaults.countries_timeout, Duration::from_secs),
        }
    }

    /// Builds the authenticator.
    #[must_use]
    pub fn to_auth(&self) -> SimulatedAuth {
        SimulatedAuth::new(self.auth_send_delay, self.auth_verify_delay)
    }

    /// Builds the responder.
    #[must_use]
    pub fn to_responder(&self) -> SimulatedResponder {
        SimulatedResponder::new(self.responder_min_delay, self.responder_max_delay)
    }

    /// Builds the history source.
    #[must_use]
    pub const fn to_history_source(&self) -> SimulatedHistory {
        SimulatedHistory::new(self.history.load_delay)
    }

    /// Builds the country directory: the built-in list when offline,
    /// otherwise the HTTP directory.
    ///
    /// # Errors
    ///
    /// Returns [`CountryError`] if the HTTP client cannot be built.
    pub fn to_country_directory(&self) -> Result<AnyCountryDirectory, CountryError> {
        if self.countries_offline {
            return Ok(AnyCountryDirectory::Static(
                StaticCountryDirectory::builtin(),
            ));
        }
        HttpCountryDirectory::new(self.countries_endpoint.clone(), self.countries_timeout)
            .map(AnyCountryDirectory::Http)
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal chat with a simulated AI assistant")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/aichat/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Snapshot file (default: `<data dir>/aichat/aichat-storage.json`).
    #[arg(long, env = "AICHAT_STORAGE")]
    pub storage: Option<PathBuf>,

    /// Keep chats in memory only; nothing is written to disk.
    #[arg(long)]
    pub ephemeral: bool,

    /// Use the built-in country list instead of the network.
    #[arg(long)]
    pub offline: bool,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "AICHAT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/aichat.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// An explicit path must exist. Without one, the default path is tried and
/// a missing file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
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
        config_dir.join("aichat").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
