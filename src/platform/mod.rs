//! Platform descriptors: the os/architecture/variant triple an image runs on

use crate::constants::platform::FIELD_SEPARATOR;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;


/// Platform of a single manifest in a list.
///
/// Two platforms collide in a list when their os, architecture and variant are
/// equal; the optional extras do not take part in that comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(rename = "os.version", skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(rename = "os.features", skip_serializing_if = "Option::is_none")]
    pub os_features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl Platform {
    /// An empty variant is the same as no variant.
    pub fn new(os: impl Into<String>, architecture: impl Into<String>, variant: Option<String>) -> Self {
        Self {
            architecture: architecture.into(),
            os: os.into(),
            variant: variant.filter(|v| !v.is_empty()),
            os_version: None,
            os_features: None,
            features: None,
        }
    }

    /// Parse a command-line token of the form `os/arch` or `os/arch/variant`.
    pub fn parse(token: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedPlatform {
            token: token.to_string(),
        };

        let parts: Vec<&str> = token.split(FIELD_SEPARATOR).collect();
        let (os, arch, variant) = match parts.as_slice() {
            [os, arch] => (*os, *arch, None),
            [os, arch, variant] => (*os, *arch, Some(variant.to_string())),
            _ => return Err(malformed()),
        };

        if os.is_empty() || arch.is_empty() {
            return Err(malformed());
        }

        Ok(Self::new(os, arch, variant))
    }

    /// Variant, or the empty string when there is none
    pub fn variant_str(&self) -> &str {
        self.variant.as_deref().unwrap_or("")
    }

    /// Identity of this platform within a manifest list
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.os, &self.architecture, self.variant_str())
    }
}

impl PartialEq for Platform {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Platform {}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.os, FIELD_SEPARATOR, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "{}{}", FIELD_SEPARATOR, variant)?;
        }
        Ok(())
    }
}
