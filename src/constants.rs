/// Manifest media types understood by the registry
pub mod media_type {
    /// Docker image manifest, schema 2
    pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker manifest list, schema 2
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// OCI image manifest
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

    /// OCI image index
    pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

    /// Media types accepted when inspecting a source image
    pub const ACCEPTED: &[&str] = &[
        DOCKER_MANIFEST,
        OCI_MANIFEST,
        DOCKER_MANIFEST_LIST,
        OCI_INDEX,
    ];

    /// Whether the media type names a list of manifests rather than a single image
    pub fn is_list(media_type: &str) -> bool {
        media_type == DOCKER_MANIFEST_LIST || media_type == OCI_INDEX
    }
}

/// Placeholder tokens recognised in image templates
pub mod placeholder {
    pub const ARCH: &str = "ARCH";
    pub const OS: &str = "OS";
    pub const VARIANT: &str = "VARIANT";
}

/// Separators used in command-line platform lists
pub mod platform {
    /// Separates platform tokens in a list
    pub const LIST_SEPARATOR: char = ',';

    /// Separates os, architecture and variant within a token
    pub const FIELD_SEPARATOR: char = '/';
}

/// Default file locations
pub mod path {
    /// Directory under the user's config dir holding `config.toml`
    pub const CONFIG_DIR: &str = "mlist";

    pub const CONFIG_FILE: &str = "config.toml";

    /// Directory under `$HOME` holding the Docker credential store
    pub const DOCKER_DIR: &str = ".docker";

    pub const DOCKER_CONFIG_FILE: &str = "config.json";
}
