//! Server configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. optional file named by `ORGTREE_CONFIG` (format from extension)
//! 3. `ORGTREE__*` environment variables, `__` between path segments
//!    (e.g. `ORGTREE__HTTP__ADDRESS=0.0.0.0:8080`)

use config::{Config, ConfigError, Environment, File};
use orgtree_core::db::{open_db, open_db_in_memory, DbResult};
use orgtree_core::default_log_level;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "ORGTREE_CONFIG";
pub const ENV_PREFIX: &str = "ORGTREE";
/// Database path that selects a throwaway in-memory database.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Deployment environment. Controls logging defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Local,
    Dev,
    Prod,
}

impl AppEnv {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub env: AppEnv,
    pub http: HttpSettings,
    pub database: DatabaseSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// `host:port` to bind.
    pub address: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path, or `:memory:`.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    /// Log directory. Unset logs to stderr; relative paths resolve against
    /// the working directory.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Settings {
    /// Loads settings from defaults, `ORGTREE_CONFIG` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        Self::load_from(file.as_deref(), env_source())
    }

    /// Loads settings from defaults, an optional file and the given
    /// environment source.
    pub fn load_from(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("env", AppEnv::Local.as_str())?
            .set_default("http.address", "127.0.0.1:8080")?
            .set_default("http.request_timeout_secs", 4)?
            .set_default("database.path", "orgtree.sqlite3")?
            .set_default("log.level", default_log_level())?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Self = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.address.trim().is_empty() {
            return Err(ConfigError::Message("http.address must not be empty".into()));
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "http.request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Message("database.path must not be empty".into()));
        }
        Ok(())
    }

    /// Level passed to logging init. `local` always logs at `debug`.
    pub fn effective_log_level(&self) -> &str {
        match self.env {
            AppEnv::Local => "debug",
            AppEnv::Dev | AppEnv::Prod => &self.log.level,
        }
    }

    /// Absolute log directory, if file logging is configured.
    pub fn log_dir(&self) -> std::io::Result<Option<PathBuf>> {
        let Some(dir) = self.log.dir.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if dir.is_empty() {
            return Ok(None);
        }
        let path = Path::new(dir);
        if path.is_absolute() {
            return Ok(Some(path.to_path_buf()));
        }
        Ok(Some(std::env::current_dir()?.join(path)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }
}

impl DatabaseSettings {
    /// Opens and migrates the configured database.
    pub fn open(&self) -> DbResult<Connection> {
        if self.path == IN_MEMORY_DATABASE {
            open_db_in_memory()
        } else {
            open_db(&self.path)
        }
    }
}

/// `ORGTREE__*` process environment source.
pub fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
