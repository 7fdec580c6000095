use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Optional manifest document that names the current catalog URL
    #[serde(default)]
    pub manifest_url: Option<String>,
    /// Static catalog URL used when the manifest is absent or fails.
    /// This is the ONLY mandatory field.
    #[serde(default)]
    pub fallback_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted watch-progress log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            manifest_url: None,
            fallback_url: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Validate the loaded configuration before the engine starts
    pub fn validate(&self) -> Result<(), String> {
        if self.catalog.fallback_url.trim().is_empty() {
            return Err("catalog.fallback_url must be set".to_string());
        }
        if url::Url::parse(&self.catalog.fallback_url).is_err() {
            return Err(format!(
                "catalog.fallback_url is not a valid URL: {}",
                self.catalog.fallback_url
            ));
        }
        if let Some(manifest_url) = &self.catalog.manifest_url
            && url::Url::parse(manifest_url).is_err()
        {
            return Err(format!(
                "catalog.manifest_url is not a valid URL: {manifest_url}"
            ));
        }
        if self.catalog.connect_timeout_secs == 0 {
            return Err("catalog.connect_timeout_secs must be positive".to_string());
        }
        Ok(())
    }
}
