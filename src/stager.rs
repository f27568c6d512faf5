//! Artifact discovery, staging and checksumming.
//!
//! Build outputs are picked up from the top level of the source directory,
//! copied into `<release dir>/<version>/` under their versioned names, and
//! hashed so the manifest can record a digest for each one.

use crate::atomic_file;
use crate::error::{PublisherError, Result};
use crate::naming::{split_matching, versioned_name};
use crate::sha256_digest::Sha256Digest;
use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use sha2::{Digest, Sha256};
use std::fs;

/// Default local release root.
pub const DEFAULT_RELEASE_DIR: &str = "downloads";

/// Default archive extension picked up from the source directory.
pub const DEFAULT_EXTENSION: &str = "zip";

/// A build output copied into the version directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Versioned filename, `<base>-<version>.<ext>`.
    pub file_name: String,
    /// Full path of the staged copy.
    pub path: Utf8PathBuf,
}

/// Copies build outputs into a version-scoped release directory.
#[derive(Debug, Clone)]
pub struct Stager {
    source_dir: Utf8PathBuf,
    release_dir: Utf8PathBuf,
    extension: String,
}

impl Stager {
    /// Create a stager that moves `.<extension>` files from `source_dir` into
    /// version directories under `release_dir`.
    #[must_use]
    pub fn new(source_dir: Utf8PathBuf, release_dir: Utf8PathBuf, extension: &str) -> Self {
        Self {
            source_dir,
            release_dir,
            extension: extension.to_owned(),
        }
    }

    /// Ensure the release root exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.release_dir)
            .map_err(|e| PublisherError::io_at(&self.release_dir, e))
    }

    /// Return the directory artifacts for `version` are staged into.
    #[must_use]
    pub fn version_dir(&self, version: &Version) -> Utf8PathBuf {
        self.release_dir.join(version.to_string())
    }

    /// Copy every matching build output into the version directory.
    ///
    /// Only regular files directly inside the source directory are
    /// considered. Artifacts are returned in directory listing order, which
    /// is not necessarily sorted. Each copy keeps the source file's
    /// permission bits.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::NoArtifactsFound`] if nothing matched; the
    /// version directory has already been created by then. Returns
    /// [`PublisherError::IoAt`] if the source directory cannot be listed or a
    /// file cannot be copied.
    pub fn stage(&self, version: &Version) -> Result<Vec<StagedArtifact>> {
        let version_dir = self.version_dir(version);
        fs::create_dir_all(&version_dir).map_err(|e| PublisherError::io_at(&version_dir, e))?;

        let mut staged = Vec::new();
        for (source, base) in self.discover()? {
            let file_name = versioned_name(&base, version, &self.extension);
            let dest = version_dir.join(&file_name);
            log::debug!("staging {source} as {dest}");
            copy_preserving_permissions(&source, &dest)?;
            staged.push(StagedArtifact {
                file_name,
                path: dest,
            });
        }

        if staged.is_empty() {
            return Err(PublisherError::NoArtifactsFound {
                source_dir: self.source_dir.clone(),
                extension: self.extension.clone(),
            });
        }
        Ok(staged)
    }

    /// List matching files in the source directory with their base names.
    fn discover(&self) -> Result<Vec<(Utf8PathBuf, String)>> {
        let listing = self
            .source_dir
            .read_dir_utf8()
            .map_err(|e| PublisherError::io_at(&self.source_dir, e))?;

        let mut found = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|e| PublisherError::io_at(&self.source_dir, e))?;
            let Some(base) = split_matching(entry.file_name(), &self.extension) else {
                continue;
            };
            let metadata = fs::metadata(entry.path())
                .map_err(|e| PublisherError::io_at(entry.path(), e))?;
            if metadata.is_file() {
                found.push((entry.path().to_owned(), base.to_owned()));
            }
        }
        Ok(found)
    }
}

/// Copy `source` to `dest` through a temporary file and apply the source's
/// permissions to the result.
fn copy_preserving_permissions(source: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    let mut input = fs::File::open(source).map_err(|e| PublisherError::io_at(source, e))?;
    let permissions = input
        .metadata()
        .map_err(|e| PublisherError::io_at(source, e))?
        .permissions();

    atomic_file::write_with(dest, |writer| {
        std::io::copy(&mut input, writer)?;
        Ok(())
    })?;
    fs::set_permissions(dest, permissions).map_err(|e| PublisherError::io_at(dest, e))
}

/// Compute the SHA-256 digest of the file at `path`.
///
/// The file is streamed through the hasher rather than read into memory.
///
/// # Errors
///
/// Returns [`PublisherError::IoAt`] if the file cannot be opened or read.
pub fn checksum(path: &Utf8Path) -> Result<Sha256Digest> {
    let mut file = fs::File::open(path).map_err(|e| PublisherError::io_at(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| PublisherError::io_at(path, e))?;
    Ok(Sha256Digest::from_output(&hasher.finalize()))
}

#[cfg(test)]
#[path = "stager_tests.rs"]
mod tests;
