use serde::Deserialize;

use crate::error::EngineError;

/// Root configuration, parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RuttConfig {
    /// HTTP API port.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_api_port() -> u16 {
    8084
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for RuttConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bind: default_bind(),
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Connection string: `memory:`, `file:<dir>` or `sqlite:<path>`.
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Pool size, sqlite only.
    #[serde(default)]
    pub max_connections: Option<u32>,
}

fn default_store_url() -> String {
    "memory:".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            max_connections: None,
        }
    }
}

impl RuttConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// `host:port` for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = RuttConfig::parse("").unwrap();
        assert_eq!(config.api_port, 8084);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.listen_addr(), "0.0.0.0:8084");
    }

    #[test]
    fn full_file() {
        let config = RuttConfig::parse(
            r#"
            api_port = 9000
            bind = "127.0.0.1"

            [store]
            url = "sqlite:.data/rutt.db"
            max_connections = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
        assert_eq!(config.store.url, "sqlite:.data/rutt.db");
        assert_eq!(config.store.max_connections, Some(8));
    }

    #[test]
    fn wrong_type_is_config_error() {
        let err = RuttConfig::parse("api_port = \"http\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn missing_file_names_path() {
        let err = RuttConfig::load("/nonexistent/rutt.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rutt.toml"));
    }
}
