//! Operator-facing progress and summary lines.
//!
//! Progress goes to an injected writer (stderr in the binary) so tests can
//! capture it. Write failures are ignored: losing a progress line must never
//! fail a release.

use camino::Utf8Path;
use semver::Version;
use std::io::Write;

/// Write `message` followed by a newline, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format the closing summary of a release.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use relay_publisher::output::success_message;
/// use semver::Version;
///
/// let version_dir = Utf8Path::new("downloads/0.0.1");
/// let message = success_message(&Version::new(0, 0, 1), version_dir, 1, false);
/// assert_eq!(message, "Released version 0.0.1 in downloads/0.0.1 with 1 file(s)");
/// ```
#[must_use]
pub fn success_message(
    version: &Version,
    version_dir: &Utf8Path,
    file_count: usize,
    dry_run: bool,
) -> String {
    let message = format!("Released version {version} in {version_dir} with {file_count} file(s)");
    if dry_run {
        format!("{message} (dry run, not published)")
    } else {
        message
    }
}
