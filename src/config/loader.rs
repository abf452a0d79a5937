//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from YAML files, and [`ServerSettings`] for the process-level
//! settings the server binary reads from its environment.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, OvertimePolicy, PaginationPolicy, PayrollPolicy};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/payroll/
/// ├── payroll.yaml     # Salary proration, overtime rate and tax rule
/// ├── overtime.yaml    # Overtime limits and the regular-hours window
/// └── pagination.yaml  # Default and maximum page sizes
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/payroll").unwrap();
/// println!("Overtime multiplier: {}", loader.config().payroll.overtime_multiplier);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any file is missing or is not valid YAML for its
    /// section.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let payroll = Self::load_yaml::<PayrollPolicy>(&path.join("payroll.yaml"))?;
        let overtime = Self::load_yaml::<OvertimePolicy>(&path.join("overtime.yaml"))?;
        let pagination = Self::load_yaml::<PaginationPolicy>(&path.join("pagination.yaml"))?;

        if payroll.hours_per_day.is_zero() {
            return Err(EngineError::ConfigParseError {
                path: path.join("payroll.yaml").display().to_string(),
                message: "hours_per_day must be greater than zero".to_string(),
            });
        }

        info!(path = %path.display(), "Loaded payroll configuration");

        Ok(Self {
            config: EngineConfig {
                payroll,
                overtime,
                pagination,
            },
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}

/// Process-level settings for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Socket the HTTP server binds to.
    pub host_address: SocketAddr,
    /// Directory holding the YAML configuration.
    pub config_dir: PathBuf,
}

impl ServerSettings {
    /// Default bind address.
    pub const DEFAULT_HOST_ADDRESS: &'static str = "127.0.0.1:3000";
    /// Default configuration directory.
    pub const DEFAULT_CONFIG_DIR: &'static str = "./config/payroll";

    /// Reads `HOST_ADDRESS` and `PAYROLL_CONFIG_DIR`, falling back to defaults.
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EngineResult<Self> {
        let host = lookup("HOST_ADDRESS").unwrap_or_else(|| Self::DEFAULT_HOST_ADDRESS.to_string());
        let host_address: SocketAddr = host.parse().map_err(|_| EngineError::ConfigParseError {
            path: "HOST_ADDRESS".to_string(),
            message: format!("`{}` is not a valid socket address", host),
        })?;

        let config_dir = lookup("PAYROLL_CONFIG_DIR")
            .unwrap_or_else(|| Self::DEFAULT_CONFIG_DIR.to_string())
            .into();

        Ok(Self {
            host_address,
            config_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_load_shipped_config_matches_defaults() {
        let loader = ConfigLoader::load("./config/payroll").unwrap();
        assert_eq!(loader.config(), &EngineConfig::default());
    }

    #[test]
    fn test_load_missing_directory() {
        let result = ConfigLoader::load("./config/does-not-exist");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.ends_with("payroll.yaml"));
            }
            other => panic!("expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_keeps_values() {
        let mut config = EngineConfig::default();
        config.payroll.overtime_multiplier = Decimal::from(2);
        let loader = ConfigLoader::from_config(config.clone());
        assert_eq!(loader.into_config(), config);
    }

    #[test]
    fn test_server_settings_defaults() {
        let settings = ServerSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.host_address.to_string(), "127.0.0.1:3000");
        assert_eq!(settings.config_dir, PathBuf::from("./config/payroll"));
    }

    #[test]
    fn test_server_settings_rejects_bad_address() {
        let result = ServerSettings::from_lookup(|key| {
            (key == "HOST_ADDRESS").then(|| "not-an-address".to_string())
        });
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }
}
