//! Versioned and alias filenames for release archives.
//!
//! A build output `<base>.<ext>` is staged as `<base>-<version>.<ext>`, and the
//! remote alias that follows the newest release is `<base>-latest.<ext>`.

use semver::Version;

/// Suffix that replaces the version in alias filenames.
pub const LATEST_SUFFIX: &str = "latest";

/// Return the base name of `file_name` if it ends in `.<extension>`,
/// compared case-insensitively.
///
/// The extension may itself contain dots (`tar.gz`). Names without a base
/// (such as `.zip`) never match.
#[must_use]
pub fn split_matching<'a>(file_name: &'a str, extension: &str) -> Option<&'a str> {
    let split = file_name.len().checked_sub(extension.len() + 1)?;
    let base = file_name.get(..split)?;
    let ext = file_name.get(split..)?.strip_prefix('.')?;
    (!base.is_empty() && ext.eq_ignore_ascii_case(extension)).then_some(base)
}

/// Staged filename for a build output with the given base name.
///
/// # Examples
///
/// ```
/// use relay_publisher::naming::versioned_name;
/// use semver::Version;
///
/// let name = versioned_name("client", &Version::new(0, 0, 1), "zip");
/// assert_eq!(name, "client-0.0.1.zip");
/// ```
#[must_use]
pub fn versioned_name(base: &str, version: &Version, extension: &str) -> String {
    format!("{base}-{version}.{extension}")
}

/// Alias filename for a staged artifact, or `None` if `staged` is not of the
/// form `<base>-<version>.<ext>`.
///
/// # Examples
///
/// ```
/// use relay_publisher::naming::alias_name;
/// use semver::Version;
///
/// let alias = alias_name("client-0.0.1.zip", &Version::new(0, 0, 1), "zip");
/// assert_eq!(alias.as_deref(), Some("client-latest.zip"));
/// ```
#[must_use]
pub fn alias_name(staged: &str, version: &Version, extension: &str) -> Option<String> {
    let suffix = format!("-{version}.{extension}");
    let base = staged.strip_suffix(&suffix)?;
    Some(format!("{base}-{LATEST_SUFFIX}.{extension}"))
}
