//! Configuration file management
//!
//! Finds, parses and writes configuration sources. YAML and JSON map onto
//! [`SuiteConfig`] directly; any other file is read as `key=value`
//! properties.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::SuiteConfig;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./config.properties",
    "./src/test/resources/config.properties",
    "./serverest.yaml",
    "./serverest.yml",
    "./serverest.json",
    "~/.config/serverest-suite/config.yaml",
];

/// On-disk configuration formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Properties,
}

impl ConfigFormat {
    /// Detect format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Properties,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            "properties" | "props" => Some(ConfigFormat::Properties),
            _ => None,
        }
    }
}

/// Find configuration file in standard locations
pub fn find_config() -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(|location| expand_path(location))
        .find(|path| path.exists())
}

/// Load configuration from the first standard location.
///
/// A missing source is fatal: the suite has no safe default target.
pub fn load_default() -> Result<SuiteConfig> {
    match find_config() {
        Some(path) => load_config(path),
        None => anyhow::bail!(
            "No configuration found. Looked in: {}",
            CONFIG_LOCATIONS.join(", ")
        ),
    }
}

/// Load configuration from file
pub fn load_config(path: impl AsRef<Path>) -> Result<SuiteConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content, ConfigFormat::from_path(path))
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config.validate()?;
    Ok(config)
}

/// Parse configuration text in the given format
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<SuiteConfig> {
    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).context("Invalid YAML config")?,
        ConfigFormat::Json => serde_json::from_str(content).context("Invalid JSON config")?,
        ConfigFormat::Properties => SuiteConfig::from_properties(parse_properties(content))?,
    };
    Ok(config)
}

/// Render configuration in the given format
pub fn render_config(config: &SuiteConfig, format: ConfigFormat) -> Result<String> {
    let content = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config).context("Failed to serialize config")?,
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).context("Failed to serialize config")?
        }
        ConfigFormat::Properties => {
            let mut out = String::new();
            for (key, value) in config.to_properties() {
                out.push_str(&format!("{key}={value}\n"));
            }
            out
        }
    };
    Ok(content)
}

/// Save configuration to file, format chosen by extension
pub fn save_config(config: &SuiteConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let content = render_config(config, ConfigFormat::from_path(path))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

/// Parse `key=value` / `key: value` lines, skipping `#` and `!` comments
pub fn parse_properties(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let pos = line.find(['=', ':'])?;
            let key = line[..pos].trim();
            let value = line[pos + 1..].trim();
            (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
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
