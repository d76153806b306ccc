//! Supervisor configuration with validation and versioning.

use crate::supervisor::{SupervisorError, SupervisorResult};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration version for migration support.
/// Increment when adding new fields or changing structure.
pub const CONFIG_VERSION: u32 = 1;

pub const CONFIG_FILENAME: &str = "supervisor.toml";

const DEFAULT_HOST: &str = "localhost";
const LOOPBACK_HOST: &str = "127.0.0.1";
const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_RETENTION: usize = 7;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Config file format version
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub readiness: ReadinessSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Explicit backend executable; overrides the packaged/development lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Host name used in the published endpoint (localhost only)
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessSettings {
    /// Wait for the backend to answer HTTP before showing the window
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum wait for the first answer (seconds)
    #[serde(default = "default_readiness_timeout")]
    pub timeout_secs: u64,

    /// Delay between probes (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Per-request timeout (milliseconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory (relative to data directory)
    #[serde(default = "default_log_dir")]
    pub directory: String,

    /// Number of daily log files to keep
    #[serde(default = "default_log_retention")]
    pub retention_count: usize,
}

// === Default Value Functions ===

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_host() -> String {
    DEFAULT_HOST.into()
}
fn default_true() -> bool {
    true
}
fn default_readiness_timeout() -> u64 {
    DEFAULT_READINESS_TIMEOUT_SECS
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.into()
}
fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.into()
}
fn default_log_retention() -> usize {
    DEFAULT_LOG_RETENTION
}

// === Default Implementations ===

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: BackendSettings::default(),
            readiness: ReadinessSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            executable: None,
            host: default_host(),
        }
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_readiness_timeout(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_dir(),
            retention_count: default_log_retention(),
        }
    }
}

// === Configuration Operations ===

impl SupervisorConfig {
    /// Load config from file, creating default if not exists.
    pub fn load_or_create(data_dir: &Path) -> SupervisorResult<Self> {
        let config_path = data_dir.join(CONFIG_FILENAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let mut config: Self = toml::from_str(&content)
                .map_err(|e| SupervisorError::config_invalid(e.to_string()))?;

            // Migrate if needed
            if config.version < CONFIG_VERSION {
                config = Self::migrate(config);
                config.save(data_dir)?;
            }

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            std::fs::create_dir_all(data_dir)?;
            config.save(data_dir)?;
            Ok(config)
        }
    }

    /// Save config to file atomically.
    pub fn save(&self, data_dir: &Path) -> SupervisorResult<()> {
        let config_path = data_dir.join(CONFIG_FILENAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| SupervisorError::config_invalid(e.to_string()))?;

        let temp_path = config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, &config_path)?;

        Ok(())
    }

    fn migrate(mut config: Self) -> Self {
        // Version 0 -> 1: readiness handshake introduced
        if config.version == 0 {
            config.readiness = ReadinessSettings::default();
            config.version = 1;
        }

        config
    }

    /// Validate configuration values.
    pub fn validate(&self) -> SupervisorResult<()> {
        // The endpoint is handed to the UI; it must never leave the machine
        if self.backend.host != DEFAULT_HOST && self.backend.host != LOOPBACK_HOST {
            return Err(SupervisorError::config_invalid(format!(
                "Backend host must be {DEFAULT_HOST} or {LOOPBACK_HOST}"
            )));
        }

        if let Some(ref executable) = self.backend.executable
            && executable.as_os_str().is_empty()
        {
            return Err(SupervisorError::config_invalid(
                "Backend executable override must not be empty",
            ));
        }

        if self.readiness.enabled {
            if self.readiness.timeout_secs == 0 {
                return Err(SupervisorError::config_invalid(
                    "Readiness timeout must be > 0",
                ));
            }
            if self.readiness.poll_interval_ms == 0 {
                return Err(SupervisorError::config_invalid(
                    "Readiness poll interval must be > 0",
                ));
            }
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(SupervisorError::config_invalid(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        if self.logging.retention_count == 0 {
            return Err(SupervisorError::config_invalid(
                "Log retention count must be > 0",
            ));
        }

        Ok(())
    }
}
