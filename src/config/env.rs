//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use super::{parse_bool, SuiteConfig};

/// Environment variable prefix
const ENV_PREFIX: &str = "SERVEREST";

/// Overrides read from SERVEREST_* environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Base URI from SERVEREST_BASE_URI
    pub base_uri: Option<String>,
    /// Base path from SERVEREST_BASE_PATH
    pub base_path: Option<String>,
    /// Timeout from SERVEREST_TIMEOUT
    pub timeout: Option<u64>,
    /// Request logging from SERVEREST_REQUEST_LOGGING
    pub request_logging: Option<bool>,
    /// Response logging from SERVEREST_RESPONSE_LOGGING
    pub response_logging: Option<bool>,
    /// Parallel limit from SERVEREST_MAX_CONCURRENT
    pub max_concurrent: Option<usize>,
    /// Config file from SERVEREST_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            base_uri: get_env("BASE_URI"),
            base_path: get_env("BASE_PATH"),
            timeout: get_env_parse("TIMEOUT"),
            request_logging: get_env_bool("REQUEST_LOGGING"),
            response_logging: get_env_bool("RESPONSE_LOGGING"),
            max_concurrent: get_env_parse("MAX_CONCURRENT"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.base_uri.is_some()
            || self.base_path.is_some()
            || self.timeout.is_some()
            || self.request_logging.is_some()
            || self.response_logging.is_some()
            || self.max_concurrent.is_some()
            || self.config_file.is_some()
    }

    /// Apply the overrides that are set on top of `config`
    pub fn apply(&self, config: &mut SuiteConfig) {
        if let Some(uri) = &self.base_uri {
            config.base_uri = uri.clone();
        }
        if let Some(path) = &self.base_path {
            config.base_path = path.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(enabled) = self.request_logging {
            config.request_logging = enabled;
        }
        if let Some(enabled) = self.response_logging {
            config.response_logging = enabled;
        }
        if let Some(max) = self.max_concurrent {
            config.max_concurrent = max;
        }
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
    get_env(name).map(|v| parse_bool(&v))
}

/// Print all SERVEREST environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_BASE_URI          Address of the service under test");
    println!("  {ENV_PREFIX}_BASE_PATH         Path prefix for every endpoint");
    println!("  {ENV_PREFIX}_TIMEOUT           Request timeout in seconds");
    println!("  {ENV_PREFIX}_REQUEST_LOGGING   Log every request (true/false)");
    println!("  {ENV_PREFIX}_RESPONSE_LOGGING  Log every response (true/false)");
    println!("  {ENV_PREFIX}_MAX_CONCURRENT    Suites run at once with --parallel");
    println!("  {ENV_PREFIX}_CONFIG            Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_BASE_URI=http://localhost:3000");
    println!("  serverest-suite run --suite users");
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
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
