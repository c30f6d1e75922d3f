//! famfin.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default environment prefix of the hosting platform.
pub const DEFAULT_PLATFORM_PREFIX: &str = "VERCEL";

/// Application entry the factory builds unless configured otherwise.
pub const DEFAULT_ENTRY: &str = "famfin";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamfinConfig {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Prefix of the platform-specific variables (`VERCEL_SUPABASE_URL`).
    pub platform_prefix: String,
    /// Name of the registered application the factory constructs.
    pub entry: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            platform_prefix: DEFAULT_PLATFORM_PREFIX.to_string(),
            entry: DEFAULT_ENTRY.to_string(),
        }
    }
}

/// Local HTTP trigger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Fallback filter used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info,famfin=debug".to_string(),
        }
    }
}

impl FamfinConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FamfinConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FamfinConfig::default();
        assert_eq!(config.bridge.platform_prefix, "VERCEL");
        assert_eq!(config.bridge.entry, "famfin");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
[bridge]
entry = "ledger"

[logging]
format = "json"
"#;
        let config: FamfinConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bridge.entry, "ledger");
        assert_eq!(config.bridge.platform_prefix, "VERCEL");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_parse_empty() {
        let config: FamfinConfig = toml::from_str("").unwrap();
        assert_eq!(config, FamfinConfig::default());
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("famfin.toml");

        let mut config = FamfinConfig::default();
        config.server.port = 9090;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = FamfinConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 9090);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = FamfinConfig::from_file(Path::new("/nonexistent/famfin.toml"));
        assert!(result.is_err());
    }
}
