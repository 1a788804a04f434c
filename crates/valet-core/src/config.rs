//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub valet: ValetConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

/// Valet-operation configuration
///
/// The fallback tariff ids replace the hard-coded sentinel ids the admin UI
/// historically relied on (8 for residents, 9 for guests). They are used only
/// when no active tariff carries the matching default flag.
#[derive(Debug, Deserialize, Clone)]
pub struct ValetConfig {
    /// Tariff id applied to subscribed clients when no resident default is configured
    #[serde(default = "default_resident_fallback")]
    pub fallback_resident_tariff_id: i32,

    /// Tariff id applied to guests when no guest default is configured
    #[serde(default = "default_guest_fallback")]
    pub fallback_guest_tariff_id: i32,

    /// Length of the generated human-facing session number
    #[serde(default = "default_session_number_len")]
    pub session_number_length: usize,
}

fn default_resident_fallback() -> i32 {
    8
}

fn default_guest_fallback() -> i32 {
    9
}

fn default_session_number_len() -> usize {
    6
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("valet.fallback_resident_tariff_id", 8)?
            .set_default("valet.fallback_guest_tariff_id", 9)?
            .set_default("valet.session_number_length", 6)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with VALET_ prefix
            .add_source(
                Environment::with_prefix("VALET")
                    .separator("__")
                    .try_parsing(true),
            )
            // DATABASE_URL is the conventional name, accept it as-is
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ValetConfig {
    fn default() -> Self {
        Self {
            fallback_resident_tariff_id: 8,
            fallback_guest_tariff_id: 9,
            session_number_length: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valet_config() {
        let config = ValetConfig::default();
        assert_eq!(config.fallback_resident_tariff_id, 8);
        assert_eq!(config.fallback_guest_tariff_id, 9);
        assert_eq!(config.session_number_length, 6);
    }
}
