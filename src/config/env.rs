//! Environment variable configuration
//!
//! Provides FEATRUN_* overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "FEATRUN";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Worker count from FEATRUN_WORKERS
    pub workers: Option<usize>,
    /// Run deadline in seconds from FEATRUN_DEADLINE
    pub deadline: Option<u64>,
    /// Console format from FEATRUN_FORMAT
    pub format: Option<String>,
    /// Color toggle from FEATRUN_COLOR
    pub color: Option<bool>,
    /// Verbose from FEATRUN_VERBOSE
    pub verbose: Option<bool>,
    /// Config file from FEATRUN_CONFIG
    pub config_file: Option<String>,
    /// Run record directory from FEATRUN_REPORT_DIR
    pub report_dir: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            workers: get_env_parse("WORKERS"),
            deadline: get_env_parse("DEADLINE"),
            format: get_env("FORMAT"),
            color: get_env_bool("COLOR"),
            verbose: get_env_bool("VERBOSE"),
            config_file: get_env("CONFIG"),
            report_dir: get_env("REPORT_DIR"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.workers.is_some()
            || self.deadline.is_some()
            || self.format.is_some()
            || self.color.is_some()
            || self.verbose.is_some()
            || self.config_file.is_some()
            || self.report_dir.is_some()
    }

    /// Get workers with fallback
    pub fn workers_or(&self, default: usize) -> usize {
        self.workers.unwrap_or(default)
    }

    /// Get deadline with fallback
    pub fn deadline_or(&self, default: u64) -> u64 {
        self.deadline.unwrap_or(default)
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_WORKERS:   {:?}", ENV_PREFIX, self.workers);
        println!("  {}_DEADLINE:  {:?}", ENV_PREFIX, self.deadline);
        println!("  {}_FORMAT:    {:?}", ENV_PREFIX, self.format);
        println!("  {}_COLOR:     {:?}", ENV_PREFIX, self.color);
        println!("  {}_VERBOSE:   {:?}", ENV_PREFIX, self.verbose);
        println!("  {}_CONFIG:    {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_REPORT_DIR: {:?}", ENV_PREFIX, self.report_dir);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    /// Create a new environment builder
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set worker count
    pub fn workers(mut self, workers: usize) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_WORKERS"), workers.to_string()));
        self
    }

    /// Set deadline in seconds
    pub fn deadline(mut self, secs: u64) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_DEADLINE"), secs.to_string()));
        self
    }

    /// Set console format
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_FORMAT"), format.into()));
        self
    }

    /// Set color toggle
    pub fn color(mut self, color: bool) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_COLOR"), color.to_string()));
        self
    }

    /// Set verbose
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_VERBOSE"), verbose.to_string()));
        self
    }

    /// Set config file path
    pub fn config(mut self, path: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CONFIG"), path.into()));
        self
    }

    /// Set run record directory
    pub fn report_dir(mut self, dir: impl Into<String>) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_REPORT_DIR"), dir.into()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all FEATRUN environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_WORKERS     Number of units run concurrently");
    println!("  {ENV_PREFIX}_DEADLINE    Whole-run deadline in seconds");
    println!("  {ENV_PREFIX}_FORMAT      Console format (pretty, progress, quiet)");
    println!("  {ENV_PREFIX}_COLOR       Colorize console output (true/false)");
    println!("  {ENV_PREFIX}_VERBOSE     Enable verbose logging (true/false)");
    println!("  {ENV_PREFIX}_CONFIG      Path to configuration file");
    println!("  {ENV_PREFIX}_REPORT_DIR  Directory for saved run records");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_WORKERS=4");
    println!("  export {ENV_PREFIX}_FORMAT=progress");
    println!("  featrun run features/");
}
