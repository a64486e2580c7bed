//! Push service for orchestrating a manifest list push
//!
//! Confirms every source image with the registry, applies the missing-image
//! policy, and hands the surviving entries to the registry in a single push.

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::{
    auth::{
        AuthConfig, Credentials, DefaultKeychain, Keychain, MultiKeychain, RegistryKeychain,
        StaticKeychain,
    },
    error::Error,
    registry::{
        ConnectionPolicy, PushOutcome, PushRequest, Registry, RegistryClient, ResolvedEntry,
    },
    spec::ManifestSpec,
};

/// What to do when a source image cannot be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Abort the push
    #[default]
    Strict,
    /// Warn and leave the entry out of the list
    Lenient,
}

impl MissingPolicy {
    pub fn from_ignore_missing(ignore_missing: bool) -> Self {
        if ignore_missing {
            MissingPolicy::Lenient
        } else {
            MissingPolicy::Strict
        }
    }
}

/// Per-invocation settings for talking to the registry
#[derive(Debug, Clone, Default)]
pub struct PushContext {
    pub credentials: Credentials,
    pub connection: ConnectionPolicy,
    pub missing: MissingPolicy,
    /// Docker `config.json` used when no explicit credentials apply
    pub docker_config: PathBuf,
}

impl PushContext {
    /// Credential lookup: flags, then configured registries, then the Docker store
    pub fn keychain(&self, registries: HashMap<String, AuthConfig>) -> Box<dyn Keychain> {
        let mut keychains: Vec<Box<dyn Keychain>> = Vec::new();
        if let Some(config) = self.credentials.to_auth_config() {
            keychains.push(Box::new(StaticKeychain::new(config)));
        }
        keychains.push(Box::new(RegistryKeychain::new(registries)));
        keychains.push(Box::new(DefaultKeychain::load(&self.docker_config)));
        Box::new(MultiKeychain::new(keychains))
    }

    pub fn registry_client(&self, registries: HashMap<String, AuthConfig>) -> RegistryClient {
        RegistryClient::new(self.connection, self.keychain(registries))
    }
}

/// Service for orchestrating the push of a manifest list
pub struct PushService;

impl PushService {
    /// Resolve every entry of `spec`, then push the list exactly once.
    ///
    /// Under [`MissingPolicy::Strict`] the first unresolvable source aborts before
    /// anything is pushed. Under [`MissingPolicy::Lenient`] unresolvable sources
    /// are dropped, but an empty list is never pushed.
    pub async fn push<R>(
        registry: &mut R,
        spec: &ManifestSpec,
        missing: MissingPolicy,
    ) -> Result<PushOutcome, Error>
    where
        R: Registry + ?Sized,
    {
        info!(
            "Resolving {} source image(s) for {}",
            spec.entries.len(),
            spec.target
        );

        let mut manifests = Vec::with_capacity(spec.entries.len());
        for entry in &spec.entries {
            match registry.inspect(&entry.image).await {
                Ok(source) => manifests.push(ResolvedEntry {
                    entry: entry.clone(),
                    source,
                }),
                Err(e) if missing == MissingPolicy::Lenient => {
                    warn!(
                        "Couldn't access image {}: {:#}. Skipping due to --ignore-missing",
                        entry.image, e
                    );
                }
                Err(e) => {
                    return Err(Error::SourceImageMissing {
                        image: entry.image.clone(),
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        if manifests.is_empty() {
            return Err(Error::EmptyManifestList {
                target: spec.target.clone(),
            });
        }

        info!(
            "Pushing {} list with {} of {} manifest(s) to {}",
            spec.kind,
            manifests.len(),
            spec.entries.len(),
            spec.target
        );

        let request = PushRequest {
            target: spec.target.clone(),
            tags: spec.tags.clone(),
            kind: spec.kind,
            manifests,
        };

        Ok(registry.push_manifest_list(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::media_type;
    use crate::manifest::ManifestKind;
    use crate::registry::SourceManifest;
    use crate::spec::{ArgsInput, ManifestSpec};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// In-memory registry recording every call
    #[derive(Default)]
    struct FakeRegistry {
        missing: HashSet<String>,
        inspected: Vec<String>,
        pushed: Vec<PushRequest>,
        fail_push: bool,
    }

    impl FakeRegistry {
        fn missing(images: &[&str]) -> Self {
            Self {
                missing: images.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Registry for FakeRegistry {
        async fn inspect(&mut self, image: &str) -> anyhow::Result<SourceManifest> {
            self.inspected.push(image.to_string());
            if self.missing.contains(image) {
                return Err(anyhow!("manifest unknown"));
            }
            Ok(SourceManifest {
                digest: format!("sha256:{}", sha256::digest(image)),
                size: 100 + image.len(),
                media_type: media_type::OCI_MANIFEST.to_string(),
                blobs: vec![],
                body: vec![],
            })
        }

        async fn push_manifest_list(&mut self, request: &PushRequest) -> anyhow::Result<PushOutcome> {
            self.pushed.push(request.clone());
            if self.fail_push {
                return Err(anyhow!("unauthorized: authentication required"));
            }
            Ok(PushOutcome {
                digest: "sha256:list".to_string(),
                length: 512,
            })
        }
    }

    fn spec(platforms: &str) -> ManifestSpec {
        ManifestSpec::from_args(
            ArgsInput {
                platforms: platforms.to_string(),
                template: "myimage-ARCH".to_string(),
                target: "myimage".to_string(),
            },
            ManifestKind::Docker,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_push_all_resolved() {
        let mut registry = FakeRegistry::default();
        let outcome = PushService::push(&mut registry, &spec("linux/amd64,linux/arm64"), MissingPolicy::Strict)
            .await
            .unwrap();

        assert_eq!(outcome.digest, "sha256:list");
        assert_eq!(outcome.length, 512);
        assert_eq!(registry.inspected, vec!["myimage-amd64", "myimage-arm64"]);
        assert_eq!(registry.pushed.len(), 1);

        let request = &registry.pushed[0];
        assert_eq!(request.target, "myimage");
        assert_eq!(request.kind, ManifestKind::Docker);
        let images: Vec<&str> = request.manifests.iter().map(|m| m.entry.image.as_str()).collect();
        assert_eq!(images, vec!["myimage-amd64", "myimage-arm64"]);
    }

    #[tokio::test]
    async fn test_strict_missing_aborts_without_push() {
        let mut registry = FakeRegistry::missing(&["myimage-arm64"]);
        let err = PushService::push(
            &mut registry,
            &spec("linux/amd64,linux/arm64,linux/s390x"),
            MissingPolicy::Strict,
        )
        .await
        .unwrap_err();

        match err {
            Error::SourceImageMissing { image, reason } => {
                assert_eq!(image, "myimage-arm64");
                assert!(reason.contains("manifest unknown"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.pushed.is_empty());
        // nothing after the failing entry is looked up
        assert_eq!(registry.inspected, vec!["myimage-amd64", "myimage-arm64"]);
    }

    #[tokio::test]
    async fn test_lenient_missing_drops_entry() {
        let mut registry = FakeRegistry::missing(&["myimage-amd64"]);
        PushService::push(&mut registry, &spec("linux/amd64,linux/arm64"), MissingPolicy::Lenient)
            .await
            .unwrap();

        assert_eq!(registry.pushed.len(), 1);
        let request = &registry.pushed[0];
        assert_eq!(request.manifests.len(), 1);
        assert_eq!(request.manifests[0].entry.image, "myimage-arm64");
        assert_eq!(request.manifests[0].entry.platform.architecture, "arm64");
    }

    #[tokio::test]
    async fn test_lenient_all_missing_is_empty_list() {
        let mut registry = FakeRegistry::missing(&["myimage-amd64", "myimage-arm64"]);
        let err = PushService::push(&mut registry, &spec("linux/amd64,linux/arm64"), MissingPolicy::Lenient)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyManifestList { ref target } if target == "myimage"));
        assert!(registry.pushed.is_empty());
    }

    #[tokio::test]
    async fn test_registry_error_passed_through() {
        let mut registry = FakeRegistry {
            fail_push: true,
            ..Default::default()
        };
        let err = PushService::push(&mut registry, &spec("linux/amd64"), MissingPolicy::Strict)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Registry(_)));
        assert_eq!(err.to_string(), "unauthorized: authentication required");
        assert_eq!(registry.pushed.len(), 1);
    }

    #[tokio::test]
    async fn test_works_through_trait_object() {
        let mut registry: Box<dyn Registry> = Box::new(FakeRegistry::default());
        let outcome = PushService::push(registry.as_mut(), &spec("linux/amd64"), MissingPolicy::Strict)
            .await
            .unwrap();
        assert_eq!(outcome.digest, "sha256:list");
    }

    #[test]
    fn test_missing_policy_from_flag() {
        assert_eq!(MissingPolicy::from_ignore_missing(true), MissingPolicy::Lenient);
        assert_eq!(MissingPolicy::from_ignore_missing(false), MissingPolicy::Strict);
        assert_eq!(MissingPolicy::default(), MissingPolicy::Strict);
    }
}
