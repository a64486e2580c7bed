//! Keychain implementations for credential lookup

use super::{AuthConfig, DockerAuthEntry, DockerConfig};
use anyhow::{Context, Result};
use oci_distribution::Reference;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Trait for types that can resolve authentication for a given resource
pub trait Keychain: Send + Sync {
    /// Resolve authentication for a given resource (registry host or image reference)
    fn resolve(&self, resource: &str) -> Result<AuthConfig>;
}

/// Registry host of an image reference, as `Reference` resolves it.
///
/// Docker Hub images resolve to `docker.io`. A resource that does not parse as
/// a reference is taken to be a registry host already.
pub(crate) fn extract_registry(resource: &str) -> String {
    match Reference::from_str(resource) {
        Ok(reference) => reference.registry().to_string(),
        Err(_) => resource.to_string(),
    }
}

/// Keys a credential for `registry` may be stored under
pub(crate) fn registry_aliases(registry: &str) -> Vec<String> {
    let mut variants = vec![registry.to_string()];

    if registry == "docker.io" || registry == "index.docker.io" {
        variants.push("docker.io".to_string());
        variants.push("index.docker.io".to_string());
        variants.push("https://index.docker.io/v1/".to_string());
        variants.push("https://index.docker.io/v2/".to_string());
    } else if !registry.starts_with("http://") && !registry.starts_with("https://") {
        variants.push(format!("https://{}", registry));
        variants.push(format!("http://{}", registry));
        variants.push(format!("https://{}/v1/", registry));
        variants.push(format!("https://{}/v2/", registry));
    }

    variants
}

/// Keychain backed by the Docker `config.json` credential store
pub struct DefaultKeychain {
    config: DockerConfig,
}

impl DefaultKeychain {
    /// Load the credential store at `path`; a missing or unreadable file yields an empty store
    pub fn load(path: &Path) -> Self {
        let config = if path.exists() {
            debug!("Checking Docker config at: {}", path.display());
            match Self::read_config(path) {
                Ok(config) => {
                    debug!("Loaded Docker config from: {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring Docker config at {}: {:#}", path.display(), e);
                    DockerConfig::default()
                }
            }
        } else {
            debug!("No Docker config at {}", path.display());
            DockerConfig::default()
        };

        Self { config }
    }

    pub fn from_config(config: DockerConfig) -> Self {
        Self { config }
    }

    fn read_config(path: &Path) -> Result<DockerConfig> {
        let content = std::fs::read_to_string(path).context("Failed to read Docker config")?;
        serde_json::from_str(&content).context("Failed to parse Docker config")
    }

    /// Find auth entry for a registry
    fn find_auth_entry(&self, registry: &str) -> Option<&DockerAuthEntry> {
        registry_aliases(registry)
            .iter()
            .find_map(|variant| self.config.auths.get(variant))
    }

    /// Get credential helper for a registry
    fn get_credential_helper(&self, registry: &str) -> Option<&str> {
        registry_aliases(registry)
            .iter()
            .find_map(|variant| self.config.cred_helpers.get(variant))
            .or(self.config.creds_store.as_ref())
            .map(String::as_str)
    }

    /// Execute credential helper to get credentials
    fn execute_credential_helper(helper: &str, registry: &str) -> Result<AuthConfig> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let helper_name = format!("docker-credential-{}", helper);

        debug!(
            "Executing credential helper: {} for {}",
            helper_name, registry
        );

        let mut child = Command::new(&helper_name)
            .arg("get")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn credential helper: {}", helper_name))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(registry.as_bytes())?;
            stdin.write_all(b"\n")?;
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Credential helper {} failed: {}", helper_name, stderr.trim());
        }

        #[derive(serde::Deserialize)]
        struct HelperResponse {
            #[serde(rename = "Username")]
            username: Option<String>,
            #[serde(rename = "Secret")]
            secret: Option<String>,
        }

        let response: HelperResponse = serde_json::from_slice(&output.stdout)
            .context("Failed to parse credential helper response")?;

        Ok(AuthConfig {
            username: response.username,
            password: response.secret,
            ..Default::default()
        })
    }
}

impl Keychain for DefaultKeychain {
    fn resolve(&self, resource: &str) -> Result<AuthConfig> {
        let registry = extract_registry(resource);
        let registry = registry.as_str();

        debug!(
            "Resolving auth for resource: {} (registry: {})",
            resource, registry
        );

        if let Some(entry) = self.find_auth_entry(registry) {
            let auth_config = entry.to_auth_config();
            if !auth_config.is_anonymous() {
                debug!("Found auth entry for {}", registry);
                return Ok(auth_config);
            }
        }

        if let Some(helper) = self.get_credential_helper(registry) {
            debug!("Trying credential helper: {} for {}", helper, registry);
            match Self::execute_credential_helper(helper, registry) {
                Ok(auth_config) => return Ok(auth_config),
                Err(e) => warn!("Credential helper failed: {:#}", e),
            }
        }

        debug!("No credentials found for {}, using anonymous", registry);
        Ok(AuthConfig::anonymous())
    }
}

/// Keychain returning the same credentials for every registry
pub struct StaticKeychain {
    config: AuthConfig,
}

impl StaticKeychain {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }
}

impl Keychain for StaticKeychain {
    fn resolve(&self, _resource: &str) -> Result<AuthConfig> {
        Ok(self.config.clone())
    }
}

/// Keychain keyed by registry host, fed from the mlist config file
pub struct RegistryKeychain {
    registries: HashMap<String, AuthConfig>,
}

impl RegistryKeychain {
    pub fn new(registries: HashMap<String, AuthConfig>) -> Self {
        Self { registries }
    }
}

impl Keychain for RegistryKeychain {
    fn resolve(&self, resource: &str) -> Result<AuthConfig> {
        let registry = extract_registry(resource);
        Ok(registry_aliases(&registry)
            .iter()
            .find_map(|variant| self.registries.get(variant))
            .cloned()
            .unwrap_or_else(AuthConfig::anonymous))
    }
}

/// Multi-keychain that tries multiple keychains in order
pub struct MultiKeychain {
    keychains: Vec<Box<dyn Keychain>>,
}

impl MultiKeychain {
    pub fn new(keychains: Vec<Box<dyn Keychain>>) -> Self {
        Self { keychains }
    }
}

impl Keychain for MultiKeychain {
    fn resolve(&self, resource: &str) -> Result<AuthConfig> {
        for keychain in &self.keychains {
            match keychain.resolve(resource) {
                Ok(config) if !config.is_anonymous() => return Ok(config),
                Ok(_) => {}
                Err(e) => debug!("Keychain failed: {}", e),
            }
        }

        Ok(AuthConfig::anonymous())
    }
}
