use crate::auth::{resolve_auth, Keychain};
use crate::constants::media_type;
use crate::manifest::{ImageIndex, ManifestDescriptor, ManifestKind};
use crate::spec::ManifestEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use http::HeaderValue;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::{Client, Reference, RegistryOperation};
use serde::Deserialize;
use tracing::{debug, info};


/// Transport settings for talking to registries
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionPolicy {
    /// Accept invalid TLS certificates
    pub insecure: bool,
    /// Use plain HTTP instead of HTTPS
    pub plain_http: bool,
}

/// A source image manifest as stored in the registry
#[derive(Debug, Clone)]
pub struct SourceManifest {
    pub digest: String,
    pub size: usize,
    pub media_type: String,
    /// Config and layer digests the manifest references
    pub blobs: Vec<String>,
    pub body: Vec<u8>,
}

/// An entry whose source image was found
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub entry: ManifestEntry,
    pub source: SourceManifest,
}

/// Everything needed to push one manifest list
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub target: String,
    pub tags: Vec<String>,
    pub kind: ManifestKind,
    pub manifests: Vec<ResolvedEntry>,
}

impl PushRequest {
    pub fn index(&self) -> ImageIndex {
        let descriptors = self
            .manifests
            .iter()
            .map(|m| ManifestDescriptor {
                media_type: m.source.media_type.clone(),
                size: m.source.size as i64,
                digest: m.source.digest.clone(),
                platform: m.entry.platform.clone(),
            })
            .collect();
        ImageIndex::new(self.kind, descriptors)
    }
}

/// Digest and byte length of a pushed manifest list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub digest: String,
    pub length: usize,
}

/// Registry operations the push orchestrator depends on
#[async_trait]
pub trait Registry: Send {
    /// Look up a source image; an error means it cannot be used in a list
    async fn inspect(&mut self, image: &str) -> Result<SourceManifest>;

    /// Assemble and push the list, returning its digest and length
    async fn push_manifest_list(&mut self, request: &PushRequest) -> Result<PushOutcome>;
}

pub struct RegistryClient {
    client: Client,
    keychain: Box<dyn Keychain>,
}

impl RegistryClient {
    pub fn new(policy: ConnectionPolicy, keychain: Box<dyn Keychain>) -> Self {
        let client = Client::new(client_config(policy));
        Self { client, keychain }
    }

    /// Make a manifest from another repository of the same registry available in
    /// the target repository: mount its blobs, then push the manifest by digest.
    async fn copy_into_target(&self, target: &Reference, resolved: &ResolvedEntry) -> Result<()> {
        let source: Reference = resolved
            .entry
            .image
            .parse()
            .context("Failed to parse source image reference")?;

        if source.registry() != target.registry() {
            anyhow::bail!(
                "Cannot use source image {} from a different registry than the target {}",
                resolved.entry.image,
                target
            );
        }
        if source.repository() == target.repository() {
            return Ok(());
        }

        debug!(
            "Mounting {} blobs from {} into {}",
            resolved.source.blobs.len(),
            source.repository(),
            target.repository()
        );
        for digest in &resolved.source.blobs {
            self.client
                .mount_blob(target, &source, digest)
                .await
                .with_context(|| format!("Failed to mount blob {} from {}", digest, source))?;
        }

        let by_digest = Reference::with_digest(
            target.registry().to_string(),
            target.repository().to_string(),
            resolved.source.digest.clone(),
        );
        let content_type = HeaderValue::from_str(&resolved.source.media_type)
            .context("Invalid manifest media type")?;
        self.client
            .push_manifest_raw(&by_digest, resolved.source.body.clone(), content_type)
            .await
            .with_context(|| format!("Failed to copy manifest {} into target repository", by_digest))?;

        info!("Copied {} into {}", resolved.entry.image, target.repository());
        Ok(())
    }
}

fn client_config(policy: ConnectionPolicy) -> ClientConfig {
    ClientConfig {
        protocol: if policy.plain_http {
            ClientProtocol::Http
        } else {
            ClientProtocol::Https
        },
        accept_invalid_certificates: policy.insecure,
        ..Default::default()
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn inspect(&mut self, image: &str) -> Result<SourceManifest> {
        let reference: Reference = image.parse().context("Failed to parse image reference")?;
        let auth = resolve_auth(self.keychain.as_ref(), image)?;

        debug!("Inspecting {}", reference);

        self.client
            .auth(&reference, &auth, RegistryOperation::Pull)
            .await
            .context("Failed to authenticate with registry")?;

        let (body, digest) = self
            .client
            .pull_manifest_raw(&reference, &auth, media_type::ACCEPTED)
            .await
            .context("Failed to fetch manifest")?;

        let manifest_type = manifest_media_type(&body)?;
        if media_type::is_list(&manifest_type) {
            anyhow::bail!(
                "{} is already a manifest list; nested manifest lists are not supported",
                image
            );
        }
        let blobs = referenced_blobs(&body)?;

        debug!("{} resolved to {} ({} bytes)", image, digest, body.len());

        Ok(SourceManifest {
            digest,
            size: body.len(),
            media_type: manifest_type,
            blobs,
            body,
        })
    }

    async fn push_manifest_list(&mut self, request: &PushRequest) -> Result<PushOutcome> {
        let reference: Reference = request
            .target
            .parse()
            .with_context(|| format!("Failed to parse image reference: {}", request.target))?;
        let auth = resolve_auth(self.keychain.as_ref(), &request.target)?;

        // Authenticate with the registry
        self.client
            .auth(&reference, &auth, RegistryOperation::Push)
            .await
            .context("Failed to authenticate with registry")?;

        for resolved in &request.manifests {
            self.copy_into_target(&reference, resolved).await?;
        }

        let index = request.index();
        let body = index.to_bytes().context("Failed to serialize manifest list")?;
        let digest = format!("sha256:{}", sha256::digest(body.as_slice()));
        let content_type = HeaderValue::from_static(request.kind.media_type());

        debug!(
            "Pushing {} list with {} manifests",
            request.kind,
            index.manifests.len()
        );
        for m in &index.manifests {
            debug!("  - Platform: {}, digest: {}", m.platform, m.digest);
        }

        let manifest_url = self
            .client
            .push_manifest_raw(&reference, body.clone(), content_type.clone())
            .await
            .context("Failed to push manifest list")?;

        info!("Successfully pushed manifest list to {}", manifest_url);

        for tag in &request.tags {
            let tagged = Reference::with_tag(
                reference.registry().to_string(),
                reference.repository().to_string(),
                tag.clone(),
            );
            self.client
                .push_manifest_raw(&tagged, body.clone(), content_type.clone())
                .await
                .with_context(|| format!("Failed to push manifest list to {}", tagged))?;
            info!("Tagged manifest list as {}", tagged);
        }

        Ok(PushOutcome {
            digest,
            length: body.len(),
        })
    }
}

/// Media type of a raw manifest, falling back to its shape when `mediaType` is absent
pub fn manifest_media_type(body: &[u8]) -> Result<String> {
    #[derive(Deserialize)]
    struct Shape {
        #[serde(rename = "schemaVersion")]
        schema_version: Option<u32>,
        #[serde(rename = "mediaType")]
        media_type: Option<String>,
        manifests: Option<serde_json::Value>,
    }

    let shape: Shape = serde_json::from_slice(body).context("Failed to parse manifest")?;
    if shape.schema_version == Some(1) {
        anyhow::bail!("schema 1 manifests are not supported");
    }

    Ok(match (shape.media_type, shape.manifests) {
        (Some(declared), _) => declared,
        (None, Some(_)) => media_type::OCI_INDEX.to_string(),
        (None, None) => media_type::OCI_MANIFEST.to_string(),
    })
}

/// Config and layer digests of an image manifest
pub fn referenced_blobs(body: &[u8]) -> Result<Vec<String>> {
    #[derive(Deserialize)]
    struct Digested {
        digest: String,
    }

    #[derive(Deserialize)]
    struct Blobs {
        config: Option<Digested>,
        #[serde(default)]
        layers: Vec<Digested>,
    }

    let blobs: Blobs = serde_json::from_slice(body).context("Failed to parse manifest")?;
    Ok(blobs
        .config
        .into_iter()
        .chain(blobs.layers)
        .map(|d| d.digest)
        .collect())
}
