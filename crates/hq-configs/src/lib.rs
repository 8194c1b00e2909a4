//! # hq-configs
//!
//! Layered settings: built-in defaults, then an optional TOML file, then
//! `HOYO_HQ__<SECTION>__<KEY>` environment variables (a `.env` file is
//! loaded first if present).

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub const ENV_PREFIX: &str = "HOYO_HQ";
pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub remote: RemoteSettings,
    pub cache: CacheSettings,
    pub log: LogSettings,
    /// The `.env` file that was read, if any.
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Which `DocumentStore` backs the remote collections.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RemoteBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteSettings {
    pub backend: RemoteBackend,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CacheSettings {
    /// Local snapshot file, used when the binary is built with `cache-file`.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,hq_sync=debug`.
    pub filter: String,
    pub json: bool,
}

impl Settings {
    /// Reads `.env`, [`DEFAULT_CONFIG_FILE`] and the process environment.
    ///
    /// Nothing is logged here since tracing is configured from the result;
    /// call [`Settings::log_summary`] once a subscriber is installed.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = match dotenvy::dotenv() {
            Ok(path) => Some(path),
            Err(err) if err.not_found() => None,
            Err(err) => return Err(ConfigError::Invalid(format!(".env: {err}"))),
        };
        let mut settings = Self::from_sources(Some(DEFAULT_CONFIG_FILE), None)?;
        settings.env_file = env_file;
        Ok(settings)
    }

    /// `file` is optional on disk. `env` replaces the process environment
    /// when given.
    pub fn from_sources(
        file: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("remote.backend", "sqlite")?
            .set_default("remote.url", "sqlite:hoyo-hq.db")?
            .set_default("cache.path", "data/local-cache.json")?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?;

        if let Some(file) = file {
            builder = builder.add_source(File::new(file, FileFormat::Toml).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn log_summary(&self) {
        if let Some(path) = &self.env_file {
            debug!(path = %path.display(), "loaded .env");
        }
        info!(
            backend = ?self.remote.backend,
            host = %self.server.host,
            port = self.server.port,
            cache = %self.cache.path.display(),
            "settings loaded"
        );
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.backend == RemoteBackend::Sqlite && self.remote.url.trim().is_empty() {
            return Err(ConfigError::Invalid("remote.url is required for the sqlite backend".into()));
        }
        if self.cache.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cache.path cannot be empty".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
