//! Failures raised while resolving and pushing a manifest list

use thiserror::Error;

/// Errors produced by the specification loader, entry builder and push orchestrator.
///
/// Everything except [`Error::Registry`] is detected locally; registry failures are
/// carried through unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required argument --{name}; --platforms, --template and --target must all be set")]
    MissingArgument { name: &'static str },

    #[error("malformed platform {token:?}: expected os/arch or os/arch/variant")]
    MalformedPlatform { token: String },

    #[error("invalid manifest specification: {reason}")]
    SpecInvalid { reason: String },

    #[error("invalid image reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("duplicate platform: {first} and {second} both target the same os/arch/variant")]
    DuplicatePlatform { first: String, second: String },

    #[error("source image {image} could not be resolved: {reason}")]
    SourceImageMissing { image: String, reason: String },

    #[error("no source images remain for {target}; refusing to push an empty manifest list")]
    EmptyManifestList { target: String },

    #[error(transparent)]
    Registry(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn spec_invalid(reason: impl Into<String>) -> Self {
        Self::SpecInvalid {
            reason: reason.into(),
        }
    }
}
