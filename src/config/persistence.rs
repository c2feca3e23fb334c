//! Config file location, load and save.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::config::types::BootstrapConfig;

/// Default config location: `config.json` next to the executable
pub fn default_config_path() -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join("config.json"))
}

/// Load the config at `path`, falling back to built-in defaults when the file
/// does not exist. A file that exists but fails to parse is an error.
pub async fn load_config(path: &Path) -> Result<BootstrapConfig> {
    if !path.exists() {
        info!("Config file not found at {:?}, using built-in defaults", path);
        return Ok(BootstrapConfig::default());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: BootstrapConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {:?}", path))?;

    if config.daemon.reinstall {
        warn!("daemon.reinstall is set: the installer will run on every bootstrap");
    }

    info!("Loaded configuration from: {:?}", path);
    Ok(config)
}

pub async fn save_config(config: &BootstrapConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write config file {:?}", path))?;
    info!("Configuration saved to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json")).await.unwrap();
        assert_eq!(config, BootstrapConfig::default());
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BootstrapConfig::default();
        config.model.name = "mistral".to_string();
        config.service.user = Some("kali".to_string());
        save_config(&config, &path).await.unwrap();

        assert_eq!(load_config(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
