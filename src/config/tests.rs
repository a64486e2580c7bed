#[cfg(test)]
mod tests {
    use super::super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.manifest_type, ManifestKind::Docker);
        assert!(config.docker_cfg.is_none());
        assert!(config.registries.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
type = "oci"
docker_cfg = "/etc/docker-creds"

[registries."registry.example.com"]
username = "ci"
password = "hunter2"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.manifest_type, ManifestKind::Oci);
        assert_eq!(config.docker_cfg, Some(PathBuf::from("/etc/docker-creds")));

        let auths = config.registry_auths();
        assert_eq!(
            auths["registry.example.com"].username.as_deref(),
            Some("ci")
        );
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "type = [[[").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_docker_config_file_prefers_explicit_dir() {
        let config = Config {
            docker_cfg: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };

        assert_eq!(
            config.docker_config_file(Some(Path::new("/from/flag"))),
            PathBuf::from("/from/flag/config.json")
        );
        assert_eq!(
            config.docker_config_file(None),
            PathBuf::from("/from/config/config.json")
        );
    }
}
