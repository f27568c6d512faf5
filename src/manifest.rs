//! Manifest store for published releases.
//!
//! The manifest is a JSON array of release entries and is the single source of
//! truth for what has been published. Entries keep their insertion order; a
//! release that reuses an existing version replaces that entry in place.

use crate::atomic_file;
use crate::error::{PublisherError, Result};
use crate::sha256_digest::Sha256Digest;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs;

/// One published artifact: where it was staged and its content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLink {
    /// Staged artifact path, `<release dir>/<version>/<file>`.
    pub link: String,
    /// SHA-256 digest of the artifact bytes at publish time.
    pub sha256: Sha256Digest,
}

/// One versioned publication record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    /// Semantic version string; the identity key within a manifest.
    pub version: String,
    /// Publication time in nanoseconds since the Unix epoch (UTC).
    #[serde(rename = "utc-unixnano")]
    pub timestamp: i64,
    /// Artifacts published with this release, in staging order.
    pub links: Vec<ArtifactLink>,
}

/// Load the manifest at `path`.
///
/// A missing file is not an error: an empty manifest is written in its place
/// and an empty list is returned.
///
/// # Errors
///
/// Returns [`PublisherError::ManifestCorrupt`] if the file exists but is not a
/// valid manifest, or [`PublisherError::IoAt`] if it cannot be read or the
/// empty manifest cannot be created.
pub fn load(path: &Utf8Path) -> Result<Vec<ReleaseEntry>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("manifest {path} not found, creating an empty one");
            save(path, &[])?;
            return Ok(Vec::new());
        }
        Err(e) => return Err(PublisherError::io_at(path, e)),
    };

    serde_json::from_str(&contents).map_err(|e| PublisherError::ManifestCorrupt {
        path: path.to_owned(),
        reason: e.to_string(),
    })
}

/// Persist `entries` to `path`, replacing the previous manifest atomically.
///
/// Output is pretty-printed with two-space indentation and fields in
/// declaration order, so identical entries always produce identical bytes.
///
/// The manifest keeps the permissions of the file it replaces. A new
/// manifest is world-readable so it can be served once published.
///
/// # Errors
///
/// Returns [`PublisherError::IoAt`] if the manifest cannot be written.
pub fn save(path: &Utf8Path, entries: &[ReleaseEntry]) -> Result<()> {
    let permissions = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_manifest_permissions(),
    };

    atomic_file::write_with(path, |writer| {
        serde_json::to_writer_pretty(writer, entries).map_err(std::io::Error::from)
    })?;

    match permissions {
        Some(permissions) => {
            fs::set_permissions(path, permissions).map_err(|e| PublisherError::io_at(path, e))
        }
        None => Ok(()),
    }
}

#[cfg(unix)]
fn new_manifest_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_manifest_permissions() -> Option<fs::Permissions> {
    None
}

/// Return `entries` with `entry` inserted.
///
/// An existing entry with the same version is replaced at its current
/// position; otherwise `entry` is appended.
#[must_use]
pub fn upsert(entries: &[ReleaseEntry], entry: ReleaseEntry) -> Vec<ReleaseEntry> {
    let mut updated = entries.to_vec();
    match updated.iter_mut().find(|e| e.version == entry.version) {
        Some(existing) => *existing = entry,
        None => updated.push(entry),
    }
    updated
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
