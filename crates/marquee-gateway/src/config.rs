//! Configuration loading and typed config structures for the gateway.
//!
//! The canonical configuration lives in `marquee-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure, and
//! provides a loader that reads the file, applies environment overrides,
//! and validates the combination of settings.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! sessions:
//!   mode: per_session        # or `shared`
//! content:
//!   backend: db2             # or `catalog`
//!   catalog_path: movies.json
//!   search_page_size: 20
//!   shared_db2:              # only read when sessions.mode is `shared`
//!     hostname: 192.168.2.22
//!     database: movies
//!     dbPort: 50000
//!     restPort: 50050
//!     ssl: false
//!     username: db2inst1
//!     password: secret
//!     expiryTime: 1h
//! logging:
//!   level: info
//!   json: false
//! ```

use std::path::{Path, PathBuf};

use marquee_types::AuthSettings;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid environment override {name}: {message}")]
    Env {
        /// Name of the environment variable.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The settings parsed but do not form a usable combination.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session handling.
    #[serde(default)]
    pub sessions: SessionConfig,

    /// Content backend selection.
    #[serde(default)]
    pub content: ContentConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `MARQUEE_HOST` overrides `server.host`
    /// - `MARQUEE_PORT` overrides `server.port`
    /// - `MARQUEE_SESSION_MODE` overrides `sessions.mode`
    /// - `MARQUEE_CATALOG_PATH` overrides `content.catalog_path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the settings are inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if an override cannot be parsed.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("MARQUEE_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("MARQUEE_PORT") {
            self.server.port = val.parse().map_err(|e| ConfigError::Env {
                name: "MARQUEE_PORT",
                message: format!("{e}"),
            })?;
        }
        if let Some(val) = lookup("MARQUEE_SESSION_MODE") {
            self.sessions.mode = match val.as_str() {
                "per_session" => SessionMode::PerSession,
                "shared" => SessionMode::Shared,
                other => {
                    return Err(ConfigError::Env {
                        name: "MARQUEE_SESSION_MODE",
                        message: format!("expected `per_session` or `shared`, got `{other}`"),
                    });
                }
            };
        }
        if let Some(val) = lookup("MARQUEE_CATALOG_PATH") {
            self.content.catalog_path = Some(PathBuf::from(val));
        }
        Ok(())
    }

    /// Check that the selected backend has what it needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.search_page_size == 0 {
            return Err(ConfigError::Invalid(
                "content.search_page_size must be at least 1".to_owned(),
            ));
        }
        match self.content.backend {
            ContentBackendKind::Catalog if self.content.catalog_path.is_none() => {
                Err(ConfigError::Invalid(
                    "content.backend `catalog` requires content.catalog_path".to_owned(),
                ))
            }
            ContentBackendKind::Db2
                if self.sessions.mode == SessionMode::Shared
                    && self.content.shared_db2.is_none() =>
            {
                Err(ConfigError::Invalid(
                    "shared sessions over db2 require content.shared_db2".to_owned(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address or name to bind to (e.g. `0.0.0.0`, `localhost`).
    #[serde(default = "default_host")]
    pub host: String,
    /// The TCP port to listen on. `0` picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// How clients obtain a content handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Clients register their own backend credentials and receive a token.
    #[default]
    PerSession,
    /// One backend handle is configured at startup and shared by everyone.
    Shared,
}

/// Session handling configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Session mode.
    #[serde(default)]
    pub mode: SessionMode,
}

/// Which kind of content backend to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentBackendKind {
    /// Db2 REST service.
    #[default]
    Db2,
    /// In-memory catalog loaded from `catalog_path`.
    Catalog,
}

/// Content backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentConfig {
    /// Backend kind.
    #[serde(default)]
    pub backend: ContentBackendKind,

    /// Path to the JSON catalog (required for the `catalog` backend).
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Number of movies per search result batch.
    #[serde(default = "default_search_page_size")]
    pub search_page_size: u32,

    /// Db2 connection used by every client in shared mode.
    #[serde(default)]
    pub shared_db2: Option<AuthSettings>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            backend: ContentBackendKind::default(),
            catalog_path: None,
            search_page_size: default_search_page_size(),
            shared_db2: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_search_page_size() -> u32 {
    20
}

fn default_log_level() -> String {
    String::from("info")
}
