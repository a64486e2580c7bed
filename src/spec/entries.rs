//! Manifest entries and the builder that keeps their platforms unique

use crate::error::Error;
use crate::platform::Platform;
use oci_distribution::Reference;
use std::fmt;
use std::str::FromStr;

/// One platform-specific source image of a manifest list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub image: String,
    pub platform: Platform,
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.image, self.platform)
    }
}

/// Check that `reference` parses as `[registry/]repository[:tag][@digest]`.
pub fn validate_reference(reference: &str) -> Result<(), Error> {
    Reference::from_str(reference)
        .map(|_| ())
        .map_err(|e| Error::InvalidReference {
            reference: reference.to_string(),
            reason: e.to_string(),
        })
}

/// Check a tag against the registry tag grammar `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`.
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let leading = match chars.next() {
        Some(c) => c.is_ascii_alphanumeric() || c == '_',
        None => false,
    };
    leading
        && tag.len() <= 128
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Accumulates entries in input order, rejecting a second entry for a platform.
#[derive(Debug, Default)]
pub struct EntryBuilder {
    entries: Vec<ManifestEntry>,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: String, platform: Platform) -> Result<(), Error> {
        validate_reference(&image)?;

        let entry = ManifestEntry { image, platform };
        if let Some(existing) = self.entries.iter().find(|e| e.platform == entry.platform) {
            return Err(Error::DuplicatePlatform {
                first: existing.to_string(),
                second: entry.to_string(),
            });
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn finish(self) -> Vec<ManifestEntry> {
        self.entries
    }
}
