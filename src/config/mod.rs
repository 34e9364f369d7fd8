//! Configuration module
//!
//! Handles finding, loading and validating the runner configuration, and
//! layering environment overrides on top of it.

mod env;

pub use env::EnvConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::ReporterKind;
use crate::registry::DEFAULT_TIMEOUT_MS;
use crate::utils::LogLevel;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./eltro.yaml",
    "./eltro.yml",
    "./.eltro.yaml",
    "./eltro.json",
    "~/.config/eltro/config.yaml",
];

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EltroConfig {
    /// Default per-test deadline in milliseconds
    pub timeout_ms: u64,

    /// Reporter name (`list` or `dot`)
    pub reporter: String,

    /// Target patterns used when none are given on the command line
    pub targets: Vec<String>,

    /// Emit ANSI colors
    pub color: bool,

    /// Diagnostic log level; logging stays off when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for EltroConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            reporter: ReporterKind::default().name().to_string(),
            targets: vec!["test/**".to_string()],
            color: true,
            log_level: None,
        }
    }
}

impl EltroConfig {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the configuration file to use and load it.
    ///
    /// An explicit path wins over `ELTRO_CONFIG`, which wins over the
    /// standard locations. Environment overrides are applied afterwards.
    pub fn resolve(explicit: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let mut config = match explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_deref().map(expand_path))
        {
            Some(path) => Self::load(&path)?,
            None => Self::load_default()?,
        };

        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        debug!(path = %path.display(), "Loaded configuration");
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            anyhow::bail!("timeout_ms must be greater than zero");
        }
        self.reporter_kind()?;
        Ok(())
    }

    pub fn reporter_kind(&self) -> Result<ReporterKind> {
        ReporterKind::parse(&self.reporter).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown reporter '{}'. Valid reporters: list, dot",
                self.reporter
            )
        })
    }

    /// Layer environment overrides on top of this configuration
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(timeout) = env.timeout.filter(|ms| *ms > 0) {
            self.timeout_ms = timeout;
        }
        if let Some(reporter) = &env.reporter {
            self.reporter = reporter.clone();
        }
        if env.no_color == Some(true) {
            self.color = false;
        }
        if let Some(level) = env.log_level {
            self.log_level = Some(level);
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
