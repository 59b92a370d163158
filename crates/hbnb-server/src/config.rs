//! Runtime configuration from `HBNB_*` environment variables

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;

/// Which persistence backend to run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    File,
    Db,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_host: String,
    pub api_port: u16,
    pub type_storage: StorageType,
    /// JSON snapshot used by the file backend
    pub file_path: String,
    /// SQLite database used by the db backend
    pub db_path: String,
}

impl Settings {
    /// Defaults overlaid with the process environment.
    pub fn load() -> Result<Self> {
        Self::build(None)
    }

    /// Same as [`Settings::load`], reading variables from `vars` instead of the process.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::build(Some(vars))
    }

    fn build(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config = Config::builder()
            .set_default("api_host", "0.0.0.0")?
            .set_default("api_port", 5000)?
            .set_default("type_storage", "file")?
            .set_default("file_path", "file.json")?
            .set_default("db_path", "hbnb.db")?
            .add_source(Environment::with_prefix("HBNB").try_parsing(true).source(vars))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api_host, self.api_port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.api_host, self.api_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_vars(HashMap::new()).unwrap();
        assert_eq!(settings.api_host, "0.0.0.0");
        assert_eq!(settings.api_port, 5000);
        assert_eq!(settings.type_storage, StorageType::File);
        assert_eq!(settings.file_path, "file.json");
        assert_eq!(settings.db_path, "hbnb.db");
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_vars(vars(&[
            ("HBNB_API_HOST", "127.0.0.1"),
            ("HBNB_API_PORT", "8080"),
            ("HBNB_TYPE_STORAGE", "db"),
            ("HBNB_DB_PATH", "/tmp/x.db"),
        ]))
        .unwrap();

        assert_eq!(settings.type_storage, StorageType::Db);
        assert_eq!(settings.db_path, "/tmp/x.db");
        assert_eq!(
            settings.bind_address().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Settings::from_vars(vars(&[("HBNB_TYPE_STORAGE", "redis")])).is_err());
    }
}
