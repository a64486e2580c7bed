use crate::constants::media_type;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flavour of list pushed to the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    /// Docker v2 schema 2 manifest list
    #[default]
    Docker,
    /// OCI v1 image index
    Oci,
}

impl ManifestKind {
    pub fn media_type(self) -> &'static str {
        match self {
            ManifestKind::Docker => media_type::DOCKER_MANIFEST_LIST,
            ManifestKind::Oci => media_type::OCI_INDEX,
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestKind::Docker => f.write_str("docker"),
            ManifestKind::Oci => f.write_str("oci"),
        }
    }
}

/// Manifest list or OCI image index for multi-arch support
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageIndex {
    #[serde(rename = "schemaVersion")]
    pub schema_version: i32,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub manifests: Vec<ManifestDescriptor>,
}

/// Descriptor for a platform-specific manifest in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDescriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub size: i64,
    pub digest: String,
    pub platform: Platform,
}

impl ImageIndex {
    pub fn new(kind: ManifestKind, manifests: Vec<ManifestDescriptor>) -> Self {
        Self {
            schema_version: 2,
            media_type: kind.media_type().to_string(),
            manifests,
        }
    }

    /// Serialized body as pushed to the registry
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
