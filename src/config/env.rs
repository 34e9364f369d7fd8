//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use crate::utils::LogLevel;

/// Environment variable prefix
const ENV_PREFIX: &str = "ELTRO";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Default timeout from ELTRO_TIMEOUT
    pub timeout: Option<u64>,
    /// Reporter from ELTRO_REPORTER
    pub reporter: Option<String>,
    /// Color switch from ELTRO_NO_COLOR
    pub no_color: Option<bool>,
    /// Log level from ELTRO_LOG
    pub log_level: Option<LogLevel>,
    /// Config file from ELTRO_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any `ELTRO_*` variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        Self {
            timeout: get("TIMEOUT").and_then(|v| v.trim().parse().ok()),
            reporter: get("REPORTER"),
            no_color: get("NO_COLOR").map(|v| parse_bool(&v)),
            log_level: get("LOG").and_then(|v| LogLevel::parse(&v)),
            config_file: get("CONFIG"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
