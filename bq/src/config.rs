//! BatchQueue configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::batcher::MAX_BATCH_SIZE;
use crate::scheduler::SchedulerConfig;

/// Main BatchQueue configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispatch pacing and batch shaping
    pub scheduler: SchedulerConfig,

    /// Daemon settings
    pub daemon: DaemonConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub log_level: Option<String>,
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Unix socket the daemon listens on
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

fn default_socket_path() -> PathBuf {
    crate::ipc::get_socket_path()
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.scheduler.batch_size) {
            return Err(eyre::eyre!(
                "scheduler.batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE,
                self.scheduler.batch_size
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .batchqueue.yml
        let local_config = PathBuf::from(".batchqueue.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/batchqueue/batchqueue.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("batchqueue").join("batchqueue.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler, SchedulerConfig::default());
        assert!(config.daemon.socket_path.ends_with("batchqueue/bq.sock"));
        assert!(config.log_level.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bq.yml");
        fs::write(
            &path,
            "scheduler:\n  min_interval_ms: 250\n  batch_timeout_ms: 10000\ndaemon:\n  socket_path: /tmp/bq-test.sock\nlog_level: DEBUG\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.min_interval_ms, 250);
        assert_eq!(config.scheduler.batch_timeout_ms, Some(10000));
        assert_eq!(config.scheduler.item_delay_ms, 1000);
        assert_eq!(config.daemon.socket_path, PathBuf::from("/tmp/bq-test.sock"));
        assert_eq!(config.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_load_missing_explicit_file_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_zero_batch_size_invalid() {
        let mut config = Config::default();
        config.scheduler.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_size_above_max_invalid() {
        let mut config = Config::default();
        config.scheduler.batch_size = 10;
        assert!(config.validate().is_err());

        config.scheduler.batch_size = MAX_BATCH_SIZE;
        assert!(config.validate().is_ok());
    }
}
