//! Server configuration loaded from TOML with environment overrides.

use std::path::{Path, PathBuf};

use crime_dashboard_database::DEFAULT_DB_PATH;
use crime_dashboard_patrol::route::RoutingConfig;
use crime_dashboard_patrol_models::{DEFAULT_RADIUS_KM, SelectionPolicy, SelectorConfig};
use crime_dashboard_prediction::PredictionConfig;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "DASHBOARD_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`DashboardConfig`].
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// An environment override held an unusable value.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// A loaded setting is out of range.
    #[error("Invalid setting {field}: {message}")]
    Invalid {
        /// Dotted setting name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Crime database.
    pub database: DatabaseConfig,
    /// Directions service.
    pub routing: RoutingConfig,
    /// Prediction service.
    pub prediction: PredictionConfig,
    /// Patrol planning and playback.
    pub patrol: PatrolConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// `[database]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` file path.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

/// `[patrol]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Default search radius.
    pub radius_km: f64,
    /// Default stop ordering.
    pub policy: SelectionPolicy,
    /// Default stop cap.
    pub max_stops: Option<usize>,
    /// Playback interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            policy: SelectionPolicy::default(),
            max_stops: None,
            tick_ms: 1000,
        }
    }
}

impl PatrolConfig {
    /// Selector settings used when a request does not override them.
    #[must_use]
    pub const fn selector(&self) -> SelectorConfig {
        SelectorConfig {
            radius_km: self.radius_km,
            policy: self.policy,
            max_stops: self.max_stops,
        }
    }

    /// Playback interval.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl DashboardConfig {
    /// Loads configuration from `path`, or from [`CONFIG_ENV_VAR`] when
    /// `path` is `None`, then applies environment overrides.
    ///
    /// A missing file yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, an override is malformed, or a setting is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        Self::load_with(path.as_deref(), |name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load) with an explicit `path` and variable
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                log::warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that would otherwise fail at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `patrol.tick_ms` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.patrol.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "patrol.tick_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded config from {}", path.display());

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `BIND_ADDR`, `PORT`, `DATABASE_PATH`, `ROUTING_API_KEY`, and
    /// `PREDICTION_URL` as returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if `PORT` is not a valid port.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind_addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: port,
            })?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(api_key) = lookup("ROUTING_API_KEY") {
            self.routing.api_key = api_key;
        }
        if let Some(url) = lookup("PREDICTION_URL") {
            self.prediction.base_url = url;
        }
        Ok(())
    }
}
