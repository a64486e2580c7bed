//! Integration tests for authentication

use anyhow::Result;
use mlist::auth::{resolve_auth, AuthConfig, Credentials, DefaultKeychain, Keychain};
use mlist::service::PushContext;
use oci_distribution::secrets::RegistryAuth;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_auth_integration_with_docker_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("config.json");

    fs::write(
        &config_path,
        r#"{
        "auths": {
            "ghcr.io": {
                "auth": "dGVzdDp0ZXN0MTIz"
            },
            "https://index.docker.io/v1/": {
                "username": "testuser",
                "password": "testpass"
            }
        }
    }"#,
    )?;

    let keychain = DefaultKeychain::load(&config_path);

    let ghcr_auth = resolve_auth(&keychain, "ghcr.io/user/image:tag")?;
    assert!(matches!(ghcr_auth, RegistryAuth::Basic(ref u, ref p) if u == "test" && p == "test123"));

    let docker_auth = resolve_auth(&keychain, "library/ubuntu:latest")?;
    assert!(matches!(docker_auth, RegistryAuth::Basic(ref u, _) if u == "testuser"));

    let unknown_auth = resolve_auth(&keychain, "unknown.registry.io/image:tag")?;
    assert!(matches!(unknown_auth, RegistryAuth::Anonymous));

    Ok(())
}

#[test]
fn test_missing_docker_config_is_anonymous() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let keychain = DefaultKeychain::load(&temp_dir.path().join("config.json"));

    assert!(keychain.resolve("ghcr.io/user/image")?.is_anonymous());
    Ok(())
}

#[test]
fn test_corrupt_docker_config_is_anonymous() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, "{ not json")?;

    let keychain = DefaultKeychain::load(&config_path);
    assert!(keychain.resolve("ghcr.io/user/image")?.is_anonymous());
    Ok(())
}

#[test]
fn test_flag_credentials_take_precedence() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"auths": {"ghcr.io": {"username": "stored", "password": "stored"}}}"#,
    )?;

    let mut registries = HashMap::new();
    registries.insert(
        "quay.io".to_string(),
        AuthConfig::new("configured".to_string(), "secret".to_string()),
    );

    let context = PushContext {
        docker_config: config_path.clone(),
        ..Default::default()
    };
    let keychain = context.keychain(registries.clone());
    assert_eq!(
        keychain.resolve("ghcr.io/user/image")?.username.as_deref(),
        Some("stored")
    );
    assert_eq!(
        keychain.resolve("quay.io/org/image")?.username.as_deref(),
        Some("configured")
    );

    let context = PushContext {
        credentials: Credentials::new(Some("flag".to_string()), Some("pw".to_string())),
        docker_config: config_path,
        ..Default::default()
    };
    let keychain = context.keychain(registries);
    assert_eq!(
        keychain.resolve("ghcr.io/user/image")?.username.as_deref(),
        Some("flag")
    );
    assert_eq!(
        keychain.resolve("quay.io/org/image")?.username.as_deref(),
        Some("flag")
    );
    Ok(())
}

#[test]
fn test_configured_docker_hub_credentials_beat_docker_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"auths": {"https://index.docker.io/v1/": {"username": "stored", "password": "stored"}}}"#,
    )?;

    let mut registries = HashMap::new();
    registries.insert(
        "docker.io".to_string(),
        AuthConfig::new("configured".to_string(), "secret".to_string()),
    );

    let context = PushContext {
        docker_config: config_path,
        ..Default::default()
    };
    let keychain = context.keychain(registries);
    assert_eq!(
        keychain.resolve("myorg/myimage:1.0")?.username.as_deref(),
        Some("configured")
    );
    assert_eq!(
        keychain.resolve("index.docker.io/myorg/myimage")?.username.as_deref(),
        Some("configured")
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_credential_helper() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new()?;
    let helper = temp_dir.path().join("docker-credential-mlisttest");
    fs::write(
        &helper,
        "#!/bin/sh\nread server\necho \"{\\\"ServerURL\\\":\\\"$server\\\",\\\"Username\\\":\\\"helper-user\\\",\\\"Secret\\\":\\\"helper-secret\\\"}\"\n",
    )?;
    let mut perms = fs::metadata(&helper)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&helper, perms)?;

    let config_path = temp_dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"credHelpers": {"registry.example.com": "mlisttest"}}"#,
    )?;

    let old_path = std::env::var("PATH").unwrap_or_default();
    std::env::set_var(
        "PATH",
        format!("{}:{}", temp_dir.path().display(), old_path),
    );

    let keychain = DefaultKeychain::load(&config_path);
    let auth = resolve_auth(&keychain, "registry.example.com/team/app:1.0");

    std::env::set_var("PATH", old_path);

    assert!(matches!(
        auth?,
        RegistryAuth::Basic(ref u, ref p) if u == "helper-user" && p == "helper-secret"
    ));

    // registries without a helper stay anonymous
    assert!(keychain.resolve("other.example.com/app")?.is_anonymous());
    Ok(())
}
