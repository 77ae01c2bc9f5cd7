//! Application configuration
//!
//! Precedence, lowest to highest:
//! 1. YAML file (`config/<env>.yaml`, or `--config <path>`)
//! 2. Environment: `RUN_ADDRESS`, `DATABASE_URI`, `ACCRUAL_SYSTEM_ADDRESS`,
//!    `LOG_LEVEL`, `JWT_SECRET`
//! 3. Command line: `-a`, `-d`, `-r`, `-l`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::order::HistorySort;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing value for argument {0}")]
    MissingValue(String),

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    /// `hourly`, `daily` or `never`
    pub rotation: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub accrual: AccrualConfig,
    pub reconciliation: ReconciliationConfig,
    pub auth: AuthConfig,
    pub history: HistoryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "loyalty_mart.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            accrual: AccrualConfig::default(),
            reconciliation: ReconciliationConfig::default(),
            auth: AuthConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub run_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            run_address: "localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Empty: run on the in-memory store
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 20,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AccrualConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    /// Used when a 429 carries no usable Retry-After
    pub default_retry_after_secs: u64,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            request_timeout_ms: 5000,
            default_retry_after_secs: 60,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ReconciliationConfig {
    pub tick_interval_ms: u64,
    pub batch_size: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            batch_size: 100,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HistoryConfig {
    pub sort: HistorySort,
}

// ============================================================================
// Command line
// ============================================================================

/// Recognized command-line flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub env: Option<String>,
    pub config_path: Option<String>,
    pub run_address: Option<String>,
    pub database_uri: Option<String>,
    pub accrual_address: Option<String>,
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Parse flags, program name excluded
    pub fn parse<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cli = CliArgs::default();
        let mut iter = args.into_iter().map(Into::into);

        while let Some(flag) = iter.next() {
            let slot = match flag.as_str() {
                "-e" | "--env" => &mut cli.env,
                "-c" | "--config" => &mut cli.config_path,
                "-a" => &mut cli.run_address,
                "-d" => &mut cli.database_uri,
                "-r" => &mut cli.accrual_address,
                "-l" => &mut cli.log_level,
                _ => return Err(ConfigError::UnknownArgument(flag)),
            };
            let value = iter.next().ok_or_else(|| ConfigError::MissingValue(flag.clone()))?;
            *slot = Some(value);
        }

        Ok(cli)
    }
}

// ============================================================================
// Loading
// ============================================================================

impl AppConfig {
    /// Parse a YAML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Load `config/<env>.yaml`
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        Self::from_file(format!("config/{}.yaml", env))
    }

    /// File, then environment, then flags. `lookup` reads the environment.
    pub fn resolve(
        cli: &CliArgs,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match &cli.config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::load(cli.env.as_deref().unwrap_or("dev"))?,
        };
        config.apply_env(lookup);
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_and_args() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse(std::env::args().skip(1))?;
        Self::resolve(&cli, |key| std::env::var(key).ok())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("RUN_ADDRESS") {
            self.server.run_address = v;
        }
        if let Some(v) = get("DATABASE_URI") {
            self.database.url = v;
        }
        if let Some(v) = get("ACCRUAL_SYSTEM_ADDRESS") {
            self.accrual.base_url = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = get("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        if let Some(v) = &cli.run_address {
            self.server.run_address = v.clone();
        }
        if let Some(v) = &cli.database_uri {
            self.database.url = v.clone();
        }
        if let Some(v) = &cli.accrual_address {
            self.accrual.base_url = v.clone();
        }
        if let Some(v) = &cli.log_level {
            self.log_level = v.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.run_address.trim().is_empty() {
            return Err(ConfigError::Invalid("server.run_address is empty".into()));
        }
        if self.accrual.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("accrual.base_url is empty".into()));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret is empty (set it in the file or JWT_SECRET)".into(),
            ));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_hours must be > 0".into()));
        }
        if self.reconciliation.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconciliation.tick_interval_ms must be > 0".into(),
            ));
        }
        if self.reconciliation.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "reconciliation.batch_size must be > 0".into(),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------------

    pub fn uses_postgres(&self) -> bool {
        !self.database.url.trim().is_empty()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.reconciliation.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.accrual.request_timeout_ms)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.accrual.default_retry_after_secs)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.auth.token_ttl_hours)
    }
}
