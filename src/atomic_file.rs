//! Whole-file replacement through a sibling temporary file.
//!
//! Content is written to a temporary file in the destination's directory,
//! flushed to disk, and renamed over the destination. A failure at any point
//! leaves the destination untouched and removes the temporary file, so a
//! reader never sees a truncated manifest or artifact.

use crate::error::{PublisherError, Result};
use camino::Utf8Path;
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;

/// Write the bytes produced by `fill` to `dest`, replacing it atomically.
///
/// # Errors
///
/// Returns [`PublisherError::IoAt`] naming `dest` if the temporary file cannot
/// be created, written, synced, or renamed into place.
pub fn write_with<F>(dest: &Utf8Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let temp =
        NamedTempFile::new_in(parent_dir(dest)).map_err(|e| PublisherError::io_at(dest, e))?;
    let mut writer = BufWriter::new(temp);
    fill(&mut writer).map_err(|e| PublisherError::io_at(dest, e))?;
    let temp = writer
        .into_inner()
        .map_err(|e| PublisherError::io_at(dest, e.into_error()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| PublisherError::io_at(dest, e))?;
    temp.persist(dest)
        .map_err(|e| PublisherError::io_at(dest, e.error))?;
    Ok(())
}

/// Directory the temporary file is created in; a bare filename lives in `.`.
fn parent_dir(dest: &Utf8Path) -> &Utf8Path {
    match dest.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}
