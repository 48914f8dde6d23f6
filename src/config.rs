use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SweepError};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Settings for the trash traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Label that exempts a message from bulk trashing
    #[serde(default = "default_protected_label")]
    pub protected_label: String,
    /// Messages per listing page (Gmail caps at 500)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            protected_label: default_protected_label(),
            page_size: default_page_size(),
        }
    }
}

/// What a created filter does to matching messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub add_label_ids: Vec<String>,
    #[serde(default = "default_remove_label_ids")]
    pub remove_label_ids: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            add_label_ids: Vec::new(),
            remove_label_ids: default_remove_label_ids(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

fn default_protected_label() -> String {
    "STARRED".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_remove_label_ids() -> Vec<String> {
    vec!["INBOX".to_string()]
}

fn default_max_concurrent() -> usize {
    10
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SweepError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| SweepError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SweepError::Config(format!("Failed to create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SweepError::Config(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| SweepError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Write an example configuration file with default values
    pub async fn create_example(path: &Path) -> Result<()> {
        Self::default().save(path).await
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep.protected_label.is_empty() {
            return Err(SweepError::Config(
                "sweep.protected_label must not be empty".to_string(),
            ));
        }

        if self.sweep.page_size == 0 || self.sweep.page_size > 500 {
            return Err(SweepError::Config(format!(
                "sweep.page_size must be between 1 and 500, got {}",
                self.sweep.page_size
            )));
        }

        if self.client.max_concurrent_requests == 0 {
            return Err(SweepError::Config(
                "client.max_concurrent_requests must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
