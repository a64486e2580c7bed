use crate::auth::AuthConfig;
use crate::constants::path;
use crate::manifest::ManifestKind;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "MLIST_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Manifest kind used when `--type` is not given
    #[serde(default, rename = "type")]
    pub manifest_type: ManifestKind,

    /// Directory holding the Docker `config.json` credential store
    pub docker_cfg: Option<PathBuf>,

    /// Registry authentication configuration
    #[serde(default)]
    pub registries: HashMap<String, RegistryAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryAuth {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RegistryAuth {
    pub fn to_auth_config(&self) -> AuthConfig {
        AuthConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            ..Default::default()
        }
    }
}

impl Config {
    /// Load from `$MLIST_CONFIG`, else `<config_dir>/mlist/config.toml`, else defaults
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&explicit));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join(path::CONFIG_DIR).join(path::CONFIG_FILE);
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }
        Ok(Config::default())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", config_path.display()))?;
        Ok(config)
    }

    /// Credential store file: explicit directory, else config, else `$DOCKER_CONFIG`, else `~/.docker`
    pub fn docker_config_file(&self, explicit_dir: Option<&Path>) -> PathBuf {
        let dir = explicit_dir
            .map(Path::to_path_buf)
            .or_else(|| self.docker_cfg.clone())
            .or_else(|| std::env::var_os("DOCKER_CONFIG").map(PathBuf::from))
            .or_else(|| dirs::home_dir().map(|home| home.join(path::DOCKER_DIR)))
            .unwrap_or_else(|| PathBuf::from(path::DOCKER_DIR));
        dir.join(path::DOCKER_CONFIG_FILE)
    }

    /// Credentials from the `registries` table, keyed by registry host
    pub fn registry_auths(&self) -> HashMap<String, AuthConfig> {
        self.registries
            .iter()
            .map(|(host, auth)| (host.clone(), auth.to_auth_config()))
            .collect()
    }
}
