//! Authentication module for container registries
//!
//! Credentials come from, in order: the `--username/--password` flags, the
//! `registries` table of the mlist config file, and the Docker `config.json`
//! credential store (inline auths, then credential helpers). Anything that
//! resolves to nothing falls back to anonymous access.

use anyhow::Result;
use base64::Engine;
use oci_distribution::secrets::RegistryAuth;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod keychain;

pub use keychain::{DefaultKeychain, Keychain, MultiKeychain, RegistryKeychain, StaticKeychain};

/// Authentication configuration containing credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
}

impl AuthConfig {
    /// Create a new AuthConfig with username and password
    pub fn new(username: String, password: String) -> Self {
        Self {
            username: Some(username),
            password: Some(password),
            ..Default::default()
        }
    }

    /// Create an anonymous AuthConfig
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Check if this is anonymous authentication
    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.auth.is_none()
            && self.identity_token.is_none()
    }

    /// Convert to oci-distribution RegistryAuth
    pub fn to_registry_auth(&self) -> RegistryAuth {
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return RegistryAuth::Basic(username.clone(), password.clone());
        }

        if let Some(auth) = &self.auth {
            if let Some((user, pass)) = decode_basic_auth(auth) {
                return RegistryAuth::Basic(user, pass);
            }
        }

        // Docker stores identity tokens with this placeholder user; the registry
        // exchanges the pair for a bearer token.
        if let Some(token) = &self.identity_token {
            return RegistryAuth::Basic("<token>".to_string(), token.clone());
        }

        RegistryAuth::Anonymous
    }
}

/// Decode a base64 `user:password` pair as stored in Docker's `auth` field
fn decode_basic_auth(auth: &str) -> Option<(String, String)> {
    let decoded = base64::engine::general_purpose::STANDARD.decode(auth).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Username and password passed on the command line
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Both halves present and non-empty
    pub fn to_auth_config(&self) -> Option<AuthConfig> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(AuthConfig::new(user.to_string(), pass.to_string()))
            }
            _ => None,
        }
    }
}

/// Resolve the registry auth for an image reference
pub fn resolve_auth(keychain: &dyn Keychain, resource: &str) -> Result<RegistryAuth> {
    Ok(keychain.resolve(resource)?.to_registry_auth())
}

/// Docker config file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DockerConfig {
    #[serde(default)]
    pub auths: HashMap<String, DockerAuthEntry>,
    #[serde(rename = "credHelpers", default)]
    pub cred_helpers: HashMap<String, String>,
    #[serde(rename = "credsStore", skip_serializing_if = "Option::is_none")]
    pub creds_store: Option<String>,
}

/// Entry in the Docker config auths section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DockerAuthEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "identitytoken", skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
}

impl DockerAuthEntry {
    /// Convert to AuthConfig
    pub fn to_auth_config(&self) -> AuthConfig {
        AuthConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            auth: self.auth.clone(),
            identity_token: self.identity_token.clone(),
        }
    }
}
