//! Resolution of user input into a canonical manifest list specification
//!
//! A specification arrives either as a YAML document listing every source image
//! and its platform, or as three command-line strings: a platform list, an image
//! template and a target. Both paths end in the same [`ManifestSpec`], which is
//! fully validated before anything talks to a registry.

use crate::constants::platform::LIST_SEPARATOR;
use crate::error::Error;
use crate::manifest::ManifestKind;
use crate::platform::Platform;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

pub mod entries;
pub mod template;

pub use entries::{is_valid_tag, validate_reference, EntryBuilder, ManifestEntry};
pub use template::{has_placeholders, resolve_template};


/// YAML document describing a manifest list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    /// Target image the list is pushed to
    #[serde(default)]
    pub image: String,

    /// Additional tags the list is pushed under
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub manifests: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentEntry {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub platform: DocumentPlatform,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPlatform {
    #[serde(default)]
    pub os: String,
    #[serde(default, alias = "architecture")]
    pub arch: String,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default, rename = "os.version", alias = "osversion")]
    pub os_version: Option<String>,
    #[serde(default, rename = "os.features", alias = "osfeatures")]
    pub os_features: Option<Vec<String>>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
}

impl Document {
    pub fn from_yaml(content: &str) -> Result<Self, Error> {
        serde_yaml::from_str(content).map_err(|e| Error::spec_invalid(e.to_string()))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Can't read YAML file {}", path.display()))?;
        debug!("Loaded manifest specification from {}", path.display());
        Ok(Self::from_yaml(&content)?)
    }
}

/// The three strings supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ArgsInput {
    /// Comma-separated `os/arch[/variant]` tokens; whitespace around each token is ignored
    pub platforms: String,
    pub template: String,
    pub target: String,
}

/// Where a specification comes from; exactly one source per invocation
#[derive(Debug, Clone)]
pub enum SpecInput {
    Document(Document),
    Args(ArgsInput),
}

/// A validated manifest list ready to be pushed
#[derive(Debug, Clone)]
pub struct ManifestSpec {
    pub target: String,
    pub tags: Vec<String>,
    pub kind: ManifestKind,
    /// Never empty; platforms are unique
    pub entries: Vec<ManifestEntry>,
}

impl ManifestSpec {
    pub fn load(input: SpecInput, kind: ManifestKind) -> Result<Self, Error> {
        match input {
            SpecInput::Document(document) => Self::from_document(document, kind),
            SpecInput::Args(args) => Self::from_args(args, kind),
        }
    }

    pub fn from_document(document: Document, kind: ManifestKind) -> Result<Self, Error> {
        if document.image.is_empty() {
            return Err(Error::spec_invalid("target image is empty"));
        }
        validate_reference(&document.image)?;

        if document.manifests.is_empty() {
            return Err(Error::spec_invalid("no manifests listed"));
        }

        for (i, tag) in document.tags.iter().enumerate() {
            if tag.is_empty() {
                return Err(Error::spec_invalid(format!("tags[{}] is empty", i)));
            }
            if !is_valid_tag(tag) {
                return Err(Error::spec_invalid(format!(
                    "tags[{}] ({:?}) is not a valid tag",
                    i, tag
                )));
            }
        }

        let mut builder = EntryBuilder::new();
        for (i, entry) in document.manifests.into_iter().enumerate() {
            let DocumentEntry { image, platform } = entry;
            if image.is_empty() {
                return Err(Error::spec_invalid(format!("manifests[{}].image is empty", i)));
            }
            if platform.os.is_empty() || platform.arch.is_empty() {
                return Err(Error::spec_invalid(format!(
                    "manifests[{}] ({}) needs both platform.os and platform.arch",
                    i, image
                )));
            }

            let mut resolved = Platform::new(platform.os, platform.arch, platform.variant);
            resolved.os_version = platform.os_version;
            resolved.os_features = platform.os_features;
            resolved.features = platform.features;

            builder.push(image, resolved)?;
        }

        Ok(Self {
            target: document.image,
            tags: document.tags,
            kind,
            entries: builder.finish(),
        })
    }

    pub fn from_args(args: ArgsInput, kind: ManifestKind) -> Result<Self, Error> {
        for (name, value) in [
            ("platforms", &args.platforms),
            ("template", &args.template),
            ("target", &args.target),
        ] {
            if value.is_empty() {
                return Err(Error::MissingArgument { name });
            }
        }
        validate_reference(&args.target)?;

        if !has_placeholders(&args.template) {
            warn!(
                "Template {} has no OS, ARCH or VARIANT placeholder; every platform will use the same image",
                args.template
            );
        }

        let mut builder = EntryBuilder::new();
        for token in args.platforms.split(LIST_SEPARATOR) {
            let platform = Platform::parse(token.trim())?;
            let image = resolve_template(&args.template, &platform);
            debug!("Resolved {} for {}", image, platform);
            builder.push(image, platform)?;
        }

        Ok(Self {
            target: args.target,
            tags: Vec::new(),
            kind,
            entries: builder.finish(),
        })
    }
}
