//! Configuration module
//!
//! Layered configuration: built-in defaults, then a config file,
//! then FEATRUN_* environment variables, then command-line flags.

pub mod env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::executor::{DEFAULT_DEADLINE, DEFAULT_WORKERS};
use crate::output::ConsoleFormat;

pub use env::{EnvBuilder, EnvConfig, EnvGuard};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./featrun.yaml",
    "./featrun.yml",
    "./.featrun.yaml",
    "~/.config/featrun/config.yaml",
];

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of units run concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Whole-run deadline in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// Console format name (pretty, progress, quiet)
    #[serde(default = "default_format")]
    pub format: String,

    /// Colorize console output
    #[serde(default = "default_color")]
    pub color: bool,

    /// Directory for saved run records
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_deadline_secs() -> u64 {
    DEFAULT_DEADLINE.as_secs()
}

fn default_format() -> String {
    "pretty".to_string()
}

fn default_color() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            deadline_secs: default_deadline_secs(),
            format: default_format(),
            color: default_color(),
            report_dir: None,
        }
    }
}

impl AppConfig {
    /// Find a configuration file in the standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Resolve configuration: explicit path, then FEATRUN_CONFIG,
    /// then the standard locations, then defaults
    pub fn discover(explicit: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = &env.config_file {
            return Self::load(Path::new(path));
        }
        if let Some(path) = Self::find() {
            return Self::load(&path);
        }
        Ok(Self::default())
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

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Overlay values taken from the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(workers) = env.workers {
            self.workers = workers;
        }
        if let Some(deadline) = env.deadline {
            self.deadline_secs = deadline;
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(color) = env.color {
            self.color = color;
        }
        if let Some(dir) = &env.report_dir {
            self.report_dir = Some(PathBuf::from(dir));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.deadline_secs == 0 {
            anyhow::bail!("deadline must be at least 1 second");
        }
        if ConsoleFormat::from_str(&self.format).is_none() {
            anyhow::bail!(
                "Unknown format '{}'. Valid formats: {}",
                self.format,
                ConsoleFormat::all()
                    .iter()
                    .map(|f| f.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(())
    }

    /// Run deadline as a duration
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Parsed console format (validated, so the fallback is unreachable)
    pub fn console_format(&self) -> ConsoleFormat {
        ConsoleFormat::from_str(&self.format).unwrap_or(ConsoleFormat::Pretty)
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
