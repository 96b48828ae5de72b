//! Configuration module
//!
//! Loads the suite configuration once at startup. The resulting
//! [`SuiteConfig`] is immutable and handed explicitly to every component
//! that talks to the remote service.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub use file::{load_config, load_default, render_config, save_config, ConfigFormat};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Property keys understood in `key=value` sources
pub const KEY_BASE_URI: &str = "base.uri";
pub const KEY_BASE_PATH: &str = "base.path";
pub const KEY_REQUEST_LOGGING: &str = "enable.request.logging";
pub const KEY_RESPONSE_LOGGING: &str = "enable.response.logging";
pub const KEY_TIMEOUT: &str = "timeout.secs";
pub const KEY_MAX_CONCURRENT: &str = "max.concurrent";
pub const KEY_SKIP_TESTS: &str = "skip.tests";

const KNOWN_KEYS: [&str; 7] = [
    KEY_BASE_URI,
    KEY_BASE_PATH,
    KEY_REQUEST_LOGGING,
    KEY_RESPONSE_LOGGING,
    KEY_TIMEOUT,
    KEY_MAX_CONCURRENT,
    KEY_SKIP_TESTS,
];

/// Suite configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Scheme and authority of the service under test
    pub base_uri: String,

    /// Path prefix prepended to every endpoint
    #[serde(default)]
    pub base_path: String,

    /// Log every outgoing request
    #[serde(default)]
    pub request_logging: bool,

    /// Log every incoming response
    #[serde(default)]
    pub response_logging: bool,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum suites running at once in parallel mode
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Case names to skip
    #[serde(default)]
    pub skip_tests: Vec<String>,

    /// Any other key/value pairs from the source
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

fn default_timeout() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_uri: "https://serverest.dev".to_string(),
            base_path: String::new(),
            request_logging: false,
            response_logging: false,
            timeout_secs: default_timeout(),
            max_concurrent: default_max_concurrent(),
            skip_tests: Vec::new(),
            extra: HashMap::new(),
        }
    }
}

impl SuiteConfig {
    /// Configuration pointing at `base_uri` with defaults elsewhere
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            ..Self::default()
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_config(path)
    }

    /// Build from a flat `key=value` mapping
    pub fn from_properties(mut props: HashMap<String, String>) -> Result<Self> {
        let base_uri = props
            .remove(KEY_BASE_URI)
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("Missing required property '{KEY_BASE_URI}'"))?;

        let mut config = Self::new(base_uri.trim());

        if let Some(path) = props.remove(KEY_BASE_PATH) {
            config.base_path = path.trim().to_string();
        }
        if let Some(v) = props.remove(KEY_REQUEST_LOGGING) {
            config.request_logging = parse_bool(&v);
        }
        if let Some(v) = props.remove(KEY_RESPONSE_LOGGING) {
            config.response_logging = parse_bool(&v);
        }
        if let Some(v) = props.remove(KEY_TIMEOUT) {
            config.timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for '{KEY_TIMEOUT}': {v}"))?;
        }
        if let Some(v) = props.remove(KEY_MAX_CONCURRENT) {
            config.max_concurrent = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for '{KEY_MAX_CONCURRENT}': {v}"))?;
        }
        if let Some(v) = props.remove(KEY_SKIP_TESTS) {
            config.skip_tests = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        config.extra = props;
        Ok(config)
    }

    /// Flatten back into `key=value` pairs, sorted by key
    pub fn to_properties(&self) -> Vec<(String, String)> {
        let mut props: Vec<_> = KNOWN_KEYS
            .iter()
            .map(|key| key.to_string())
            .chain(self.extra.keys().cloned())
            .filter_map(|key| {
                let value = self.get(&key)?;
                Some((key, value))
            })
            .collect();
        props.sort();
        props
    }

    /// Raw key/value view of the configuration
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            KEY_BASE_URI => Some(self.base_uri.clone()),
            KEY_BASE_PATH => Some(self.base_path.clone()),
            KEY_REQUEST_LOGGING => Some(self.request_logging.to_string()),
            KEY_RESPONSE_LOGGING => Some(self.response_logging.to_string()),
            KEY_TIMEOUT => Some(self.timeout_secs.to_string()),
            KEY_MAX_CONCURRENT => Some(self.max_concurrent.to_string()),
            KEY_SKIP_TESTS => Some(self.skip_tests.join(",")),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Base URI joined with the base path
    pub fn base_url(&self) -> String {
        let uri = self.base_uri.trim_end_matches('/');
        let path = self.base_path.trim().trim_matches('/');
        if path.is_empty() {
            uri.to_string()
        } else {
            format!("{uri}/{path}")
        }
    }

    pub fn is_skipped(&self, case_name: &str) -> bool {
        self.skip_tests.iter().any(|s| s == case_name)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.base_uri.starts_with("http://") || self.base_uri.starts_with("https://")) {
            anyhow::bail!(
                "Invalid base URI '{}': expected an http:// or https:// address",
                self.base_uri
            );
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("Timeout must be greater than zero");
        }
        if self.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be greater than zero");
        }
        Ok(())
    }
}

/// Loose boolean parsing shared by property files and environment variables
pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
