//! Expansion of image templates such as `registry/app:v1-OS-ARCH`

use crate::constants::placeholder::{ARCH, OS, VARIANT};
use crate::platform::Platform;

/// Substitute the platform into `template`.
///
/// `ARCH`, then `OS`, then `VARIANT` are replaced in that order, each at its
/// first occurrence only. Later substitutions see the output of earlier ones,
/// so `ARCHOS` for linux/amd64 becomes `amd64linux`. Absent tokens are ignored.
pub fn resolve_template(template: &str, platform: &Platform) -> String {
    template
        .replacen(ARCH, &platform.architecture, 1)
        .replacen(OS, &platform.os, 1)
        .replacen(VARIANT, platform.variant_str(), 1)
}

/// Whether the template names at least one placeholder
pub fn has_placeholders(template: &str) -> bool {
    [ARCH, OS, VARIANT].iter().any(|token| template.contains(token))
}
