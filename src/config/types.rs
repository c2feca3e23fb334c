//! Bootstrap configuration structs and defaults.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTALL_SCRIPT_URL: &str = "https://ollama.com/install.sh";
pub const DEFAULT_DAEMON_BINARY: &str = "/usr/local/bin/ollama";
pub const DEFAULT_SERVICE_NAME: &str = "ollama";
pub const DEFAULT_UNIT_PATH: &str = "/etc/systemd/system/ollama.service";
pub const DEFAULT_PATH_ENV: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";
pub const DEFAULT_MODEL: &str = "deepseek-coder";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub daemon: DaemonSettings,
    pub service: ServiceSettings,
    pub model: ModelSettings,
    pub scaffold: ScaffoldSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    pub install_script_url: String,
    pub binary_path: PathBuf,
    pub reinstall: bool, // run the installer even if the binary exists
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub name: String,
    pub unit_path: PathBuf,
    pub description: String,
    pub path_env: String,
    pub user: Option<String>, // None = invoking user
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldSettings {
    pub script_path: PathBuf, // relative paths resolve against the working directory
    pub installer: String,
    pub package: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            install_script_url: DEFAULT_INSTALL_SCRIPT_URL.to_string(),
            binary_path: PathBuf::from(DEFAULT_DAEMON_BINARY),
            reinstall: false,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_string(),
            unit_path: PathBuf::from(DEFAULT_UNIT_PATH),
            description: "Ollama Service".to_string(),
            path_env: DEFAULT_PATH_ENV.to_string(),
            user: None,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for ScaffoldSettings {
    fn default() -> Self {
        Self {
            script_path: PathBuf::from("kali_assistant.py"),
            installer: "pip3".to_string(),
            package: "requests".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
        }
    }
}

impl ServiceSettings {
    /// Unit name as systemctl expects it, e.g. `ollama.service`
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.name)
    }
}

impl BootstrapConfig {
    /// Reject values that would render a broken unit or hand garbage to the tools.
    pub fn validate(&self) -> Result<()> {
        require_absolute("daemon.binary_path", &self.daemon.binary_path)?;
        require_absolute("service.unit_path", &self.service.unit_path)?;

        if self.daemon.install_script_url.trim().is_empty() {
            bail!("daemon.install_script_url must not be empty");
        }
        if self.service.name.trim().is_empty() || self.service.name.contains('/') {
            bail!("service.name '{}' is not a valid unit name", self.service.name);
        }
        if self.model.name.trim().is_empty() {
            bail!("model.name must not be empty");
        }
        if self.scaffold.script_path.as_os_str().is_empty() {
            bail!("scaffold.script_path must not be empty");
        }
        if self.scaffold.installer.trim().is_empty() || self.scaffold.package.trim().is_empty() {
            bail!("scaffold.installer and scaffold.package must not be empty");
        }

        // Each of these lands on a single line of the unit file
        let unit_values = [
            ("service.description", self.service.description.as_str()),
            ("service.path_env", self.service.path_env.as_str()),
            ("service.user", self.service.user.as_deref().unwrap_or("")),
        ];
        for (field, value) in unit_values {
            if value.contains('\n') || value.contains('\r') {
                bail!("{} must be a single line", field);
            }
        }

        Ok(())
    }
}

fn require_absolute(field: &str, path: &Path) -> Result<()> {
    if !path.is_absolute() {
        bail!("{} must be an absolute path (got {:?})", field, path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BootstrapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.service.unit_name(), "ollama.service");
        assert_eq!(config.model.name, "deepseek-coder");
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: BootstrapConfig =
            serde_json::from_str(r#"{ "model": { "name": "llama3:8b" } }"#).unwrap();
        assert_eq!(config.model.name, "llama3:8b");
        assert_eq!(config.daemon.binary_path, PathBuf::from(DEFAULT_DAEMON_BINARY));
        assert_eq!(config.scaffold.package, "requests");
    }

    #[test]
    fn relative_binary_path_is_rejected() {
        let mut config = BootstrapConfig::default();
        config.daemon.binary_path = PathBuf::from("bin/ollama");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("daemon.binary_path"));
    }

    #[test]
    fn multiline_unit_values_are_rejected() {
        let mut config = BootstrapConfig::default();
        config.service.description = "Ollama\nExecStartPre=/bin/false".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_model_is_rejected() {
        let mut config = BootstrapConfig::default();
        config.model.name = " ".to_string();
        assert!(config.validate().is_err());
    }
}
