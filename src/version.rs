//! Release version resolution.
//!
//! A release version is either supplied explicitly by the operator or derived
//! from the manifest by bumping the patch component of the highest version
//! already published. Versions are compared with semantic-version ordering.

use crate::error::{PublisherError, Result};
use crate::manifest::ReleaseEntry;
use semver::Version;

/// Resolve the version for the next release.
///
/// An explicit version takes precedence; otherwise the next version is
/// derived from `entries`.
///
/// # Errors
///
/// Returns [`PublisherError::InvalidVersion`] if the explicit version is not a
/// full `major.minor.patch` semantic version, or if the patch component of
/// the highest published version cannot be incremented.
///
/// # Examples
///
/// ```
/// use relay_publisher::version::resolve;
///
/// let version = resolve(None, &[])?;
/// assert_eq!(version.to_string(), "0.0.1");
///
/// let version = resolve(Some("2.1.0"), &[])?;
/// assert_eq!(version.to_string(), "2.1.0");
/// # Ok::<(), relay_publisher::error::PublisherError>(())
/// ```
pub fn resolve(explicit: Option<&str>, entries: &[ReleaseEntry]) -> Result<Version> {
    match explicit {
        Some(value) => resolve_explicit(value),
        None => resolve_automatic(entries),
    }
}

/// Parse an operator-supplied version.
///
/// Only complete versions are accepted: `1.2` and `v1.2.3` are rejected.
/// Pre-release and build metadata are kept.
///
/// # Errors
///
/// Returns [`PublisherError::InvalidVersion`] if `value` does not parse.
pub fn resolve_explicit(value: &str) -> Result<Version> {
    Version::parse(value).map_err(|e| PublisherError::InvalidVersion {
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

/// Derive the next version from the published entries.
///
/// Takes the highest parseable version (or `0.0.0` when there is none) and
/// increments its patch component, dropping pre-release and build metadata.
/// Entries whose version does not parse are skipped.
///
/// # Errors
///
/// Returns [`PublisherError::InvalidVersion`] if the patch component of the
/// highest version is already at its maximum.
pub fn resolve_automatic(entries: &[ReleaseEntry]) -> Result<Version> {
    let highest = entries
        .iter()
        .filter_map(|entry| parse_published(&entry.version))
        .max()
        .unwrap_or_else(|| Version::new(0, 0, 0));

    let patch = highest
        .patch
        .checked_add(1)
        .ok_or_else(|| PublisherError::InvalidVersion {
            value: highest.to_string(),
            reason: "patch component cannot be incremented".to_owned(),
        })?;

    Ok(Version::new(highest.major, highest.minor, patch))
}

fn parse_published(value: &str) -> Option<Version> {
    match Version::parse(value) {
        Ok(version) => Some(version),
        Err(e) => {
            log::warn!("ignoring manifest entry with unparsable version {value:?}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entries(versions: &[&str]) -> Vec<ReleaseEntry> {
        versions
            .iter()
            .map(|version| ReleaseEntry {
                version: (*version).to_owned(),
                timestamp: 0,
                links: Vec::new(),
            })
            .collect()
    }

    #[rstest]
    #[case::empty_manifest(&[], "0.0.1")]
    #[case::single(&["0.0.1"], "0.0.2")]
    #[case::semantic_not_lexical(&["0.9.0", "0.10.0", "0.2.0"], "0.10.1")]
    #[case::unordered(&["1.4.2", "2.0.0", "1.9.9"], "2.0.1")]
    #[case::skips_garbage(&["not-a-version", "1.2", "0.3.0"], "0.3.1")]
    #[case::only_garbage(&["latest", ""], "0.0.1")]
    #[case::prerelease_maximum(&["1.0.0-rc.1", "0.9.0"], "1.0.1")]
    #[case::drops_build_metadata(&["1.2.3+build.7"], "1.2.4")]
    fn automatic_bumps_the_highest_patch(#[case] versions: &[&str], #[case] expected: &str) {
        let version = resolve_automatic(&entries(versions)).expect("resolution succeeds");
        assert_eq!(version.to_string(), expected);
    }

    #[test]
    fn automatic_is_strictly_greater_than_every_entry() {
        let published = entries(&["0.1.0", "0.1.7", "0.0.9"]);

        let next = resolve_automatic(&published).expect("resolution succeeds");

        for entry in &published {
            let existing = Version::parse(&entry.version).expect("fixture is valid");
            assert!(next > existing, "{next} should exceed {existing}");
        }
    }

    #[test]
    fn automatic_reports_patch_overflow() {
        let at_limit = format!("1.0.{}", u64::MAX);
        let published = entries(&[at_limit.as_str()]);

        let err = resolve_automatic(&published).expect_err("overflow must fail");

        assert!(matches!(err, PublisherError::InvalidVersion { .. }));
    }

    #[rstest]
    #[case::plain("1.2.3", "1.2.3")]
    #[case::prerelease("1.0.0-rc.1", "1.0.0-rc.1")]
    #[case::build_metadata("1.2.3+build.5", "1.2.3+build.5")]
    fn explicit_accepts_full_versions(#[case] input: &str, #[case] expected: &str) {
        let version = resolve_explicit(input).expect("valid version");
        assert_eq!(version.to_string(), expected);
    }

    #[rstest]
    #[case::missing_patch("1.2")]
    #[case::leading_v("v1.2.3")]
    #[case::empty("")]
    #[case::words("next")]
    fn explicit_rejects_partial_versions(#[case] input: &str) {
        let err = resolve_explicit(input).expect_err("invalid version must fail");
        assert!(
            matches!(err, PublisherError::InvalidVersion { ref value, .. } if value == input),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn explicit_override_ignores_manifest() {
        let version = resolve(Some("0.5.0"), &entries(&["3.0.0"])).expect("valid version");
        assert_eq!(version.to_string(), "0.5.0");
    }
}
