//! Configuration management for rolleilookup using the prefer crate.
//!
//! Precedence, lowest first: built-in defaults, the config file (explicit
//! `--config` path or prefer discovery), then environment variables. The
//! environment names match the ones existing deployments already set.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::util::{redact_url_password, validate_database_url};
use crate::repository::{DbContext, PoolOptions, StoreError};

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "rolleilookup.db";

const DEFAULT_PG_PORT: u16 = 5432;
const DEFAULT_PG_DATABASE: &str = "rolleiflex_strapi_db";
const DEFAULT_PG_USERNAME: &str = "rolleiflex";
const DEFAULT_SCHEMA: &str = "public";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{0}")]
    DatabaseUrl(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Database section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; wins over the individual fields.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: Option<bool>,
    pub schema: Option<String>,
    pub pool_min: Option<usize>,
    pub pool_max: Option<usize>,
    /// Pool acquire timeout in milliseconds.
    pub connection_timeout: Option<u64>,
    /// Per-request store timeout in milliseconds.
    pub query_timeout: Option<u64>,
    /// SQLite filename inside the data directory.
    pub filename: Option<String>,
}

/// Server section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory path.
    pub data_dir: Option<String>,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a config file in standard locations.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read
    /// or parsed is an error.
    pub async fn load() -> Result<Self, ConfigError> {
        match prefer::load("rolleilookup").await {
            Ok(discovered) => match discovered.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default()),
            },
            Err(e) => {
                tracing::debug!("No config file discovered: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Format follows the extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parsed = match ext {
            "toml" => toml::from_str(contents).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
            _ => serde_json::from_str(contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Overlay environment variables, read through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let db = &mut self.database;

        if let Some(url) = var("DATABASE_URL") {
            db.url = Some(url);
        }
        if let Some(host) = var("DATABASE_HOST") {
            db.host = Some(host);
        }
        if let Some(name) = var("DATABASE_NAME") {
            db.name = Some(name);
        }
        if let Some(username) = var("DATABASE_USERNAME") {
            db.username = Some(username);
        }
        if let Some(password) = var("DATABASE_PASSWORD") {
            db.password = Some(password);
        }
        if let Some(schema) = var("DATABASE_SCHEMA") {
            db.schema = Some(schema);
        }
        if let Some(raw) = var("DATABASE_SSL") {
            db.ssl = Some(parse_bool("DATABASE_SSL", &raw)?);
        }
        set_parsed(&mut db.port, "DATABASE_PORT", var("DATABASE_PORT"))?;
        set_parsed(&mut db.pool_min, "DATABASE_POOL_MIN", var("DATABASE_POOL_MIN"))?;
        set_parsed(&mut db.pool_max, "DATABASE_POOL_MAX", var("DATABASE_POOL_MAX"))?;
        set_parsed(
            &mut db.connection_timeout,
            "DATABASE_CONNECTION_TIMEOUT",
            var("DATABASE_CONNECTION_TIMEOUT"),
        )?;
        set_parsed(
            &mut db.query_timeout,
            "DATABASE_QUERY_TIMEOUT",
            var("DATABASE_QUERY_TIMEOUT"),
        )?;

        if let Some(host) = var("HOST") {
            self.server.host = Some(host);
        }
        set_parsed(&mut self.server.port, "PORT", var("PORT"))?;

        Ok(())
    }
}

fn set_parsed<T: FromStr>(
    slot: &mut Option<T>,
    key: &'static str,
    raw: Option<String>,
) -> Result<(), ConfigError> {
    let Some(raw) = raw else {
        return Ok(());
    };
    match raw.trim().parse() {
        Ok(value) => {
            *slot = Some(value);
            Ok(())
        }
        Err(_) => Err(ConfigError::InvalidValue { key, value: raw }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Resolved database settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: Option<String>,
    pub ssl: bool,
    pub schema: String,
    pub filename: String,
    pub pool: PoolOptions,
    pub query_timeout: Option<Duration>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: DEFAULT_PG_PORT,
            name: DEFAULT_PG_DATABASE.to_string(),
            username: DEFAULT_PG_USERNAME.to_string(),
            password: None,
            ssl: false,
            schema: DEFAULT_SCHEMA.to_string(),
            filename: DEFAULT_DATABASE_FILENAME.to_string(),
            pool: PoolOptions::default(),
            query_timeout: None,
        }
    }
}

/// Resolved HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 1337,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base data directory (holds the SQLite database).
    pub data_dir: PathBuf,
    pub database: DatabaseSettings,
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rolleilookup");

        Self {
            data_dir,
            database: DatabaseSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Build settings from a parsed config, resolving relative paths from `base_dir`.
    pub fn from_config(config: &Config, base_dir: &Path) -> Self {
        let mut settings = Settings::default();
        if let Some(ref data_dir) = config.data_dir {
            settings.data_dir = resolve_path(data_dir, base_dir);
        }

        let file = &config.database;
        let db = &mut settings.database;
        db.url = file.url.clone();
        db.host = file.host.clone();
        db.password = file.password.clone();
        if let Some(port) = file.port {
            db.port = port;
        }
        if let Some(ref name) = file.name {
            db.name = name.clone();
        }
        if let Some(ref username) = file.username {
            db.username = username.clone();
        }
        if let Some(ssl) = file.ssl {
            db.ssl = ssl;
        }
        if let Some(ref schema) = file.schema {
            db.schema = schema.clone();
        }
        if let Some(ref filename) = file.filename {
            db.filename = filename.clone();
        }
        if let Some(min) = file.pool_min {
            db.pool.min_size = min;
        }
        if let Some(max) = file.pool_max {
            db.pool.max_size = max;
        }
        if let Some(ms) = file.connection_timeout {
            db.pool.acquire_timeout = Duration::from_millis(ms);
        }
        db.query_timeout = file
            .query_timeout
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        db.pool.tls = db.ssl;

        if let Some(ref host) = config.server.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = config.server.port {
            settings.server.port = port;
        }

        settings
    }

    /// Full path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database.filename)
    }

    /// Whether the store is a local SQLite file.
    pub fn is_sqlite(&self) -> bool {
        self.database.url.is_none() && self.database.host.is_none()
    }

    /// The connection URL for the configured store.
    ///
    /// An explicit URL wins. Otherwise a host builds a PostgreSQL URL with
    /// percent-encoded credentials. Otherwise the SQLite file in the data
    /// directory is used.
    pub fn database_url(&self) -> String {
        let db = &self.database;
        if let Some(ref url) = db.url {
            return url.clone();
        }
        let Some(ref host) = db.host else {
            return format!("sqlite:{}", self.database_path().display());
        };

        let credentials = match db.password {
            Some(ref password) => format!(
                "{}:{}",
                urlencoding::encode(&db.username),
                urlencoding::encode(password)
            ),
            None => urlencoding::encode(&db.username).into_owned(),
        };

        let mut params = Vec::new();
        if db.ssl {
            params.push("sslmode=require".to_string());
        }
        if db.schema != DEFAULT_SCHEMA {
            params.push(format!(
                "options={}",
                urlencoding::encode(&format!("-csearch_path={}", db.schema))
            ));
        }

        let mut url = format!(
            "postgres://{}@{}:{}/{}",
            credentials,
            host,
            db.port,
            urlencoding::encode(&db.name)
        );
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    /// Ensure the data directory exists (SQLite only).
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if self.is_sqlite() {
            std::fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }

    /// Create a database context using the configured store.
    pub fn create_db_context(&self) -> Result<DbContext, ConfigError> {
        let url = self.database_url();
        validate_database_url(&url).map_err(ConfigError::DatabaseUrl)?;
        tracing::debug!("Using database {}", redact_url_password(&url));
        Ok(DbContext::from_url(&url, &self.database.pool)?)
    }
}

/// Resolve a path that may be relative to the config file.
/// `~` is expanded; relative paths join `base_dir`.
pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(path_str);
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (--data flag).
    pub data: Option<PathBuf>,
}

/// Load settings: config file, then environment, then CLI overrides.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<Settings, ConfigError> {
    let mut config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };
    config.apply_env(|key| std::env::var(key).ok())?;

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or_else(|| cwd.clone());
    let mut settings = Settings::from_config(&config, &base_dir);

    if let Some(ref data) = options.data {
        apply_data_override(&mut settings, data, &cwd);
    }

    Ok(settings)
}

/// `--data` may name a directory or a `.db` file directly.
fn apply_data_override(settings: &mut Settings, data: &Path, cwd: &Path) {
    let path = if data.is_absolute() {
        data.to_path_buf()
    } else {
        cwd.join(data)
    };

    let is_db_file = path
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");

    if is_db_file {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            settings.database.filename = name.to_string();
        }
        settings.data_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    } else {
        settings.data_dir = path;
    }
}
