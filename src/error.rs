//! Error types for the release publisher.
//!
//! Every variant is fatal to a pipeline run. Each one names the path, version,
//! or file involved so the operator can fix the cause and re-run; the pipeline
//! steps are idempotent, so re-running is the only recovery mechanism.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while building, staging, or publishing a release.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// The manifest file exists but does not parse against the schema.
    #[error("manifest {path} is corrupt: {reason}")]
    ManifestCorrupt {
        /// Path to the manifest file.
        path: Utf8PathBuf,
        /// Description of the parse or validation failure.
        reason: String,
    },

    /// An I/O operation on a known path failed.
    #[error("I/O error on {path}: {source}")]
    IoAt {
        /// Path being read or written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A version string is not a full `major.minor.patch` semantic version.
    #[error("invalid version {value:?}: {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// The build script does not exist at the configured path.
    #[error("build script not found at {path}")]
    BuildScriptMissing {
        /// Where the script was expected.
        path: Utf8PathBuf,
    },

    /// The build script exited with a non-zero status.
    #[error("build script {script} failed for version {version}: {status}")]
    BuildFailed {
        /// The script that was run.
        script: Utf8PathBuf,
        /// The version passed to the script.
        version: String,
        /// Exit status description.
        status: String,
    },

    /// No files with the expected extension were found in the source directory.
    #[error("no .{extension} files found in {source_dir}")]
    NoArtifactsFound {
        /// The directory that was scanned.
        source_dir: Utf8PathBuf,
        /// The extension that was searched for.
        extension: String,
    },

    /// The remote version directory could not be created.
    #[error("failed to create remote directory {remote_dir} on {host}: {reason}")]
    RemoteDirError {
        /// Remote host in `user@host` form.
        host: String,
        /// Remote directory path.
        remote_dir: String,
        /// Description of the failure.
        reason: String,
    },

    /// A file transfer to the remote host failed.
    #[error("transfer of {file} to {host}:{remote_dir} failed: {reason}")]
    TransferError {
        /// Local file being transferred.
        file: Utf8PathBuf,
        /// Remote host in `user@host` form.
        host: String,
        /// Remote destination directory.
        remote_dir: String,
        /// Description of the failure.
        reason: String,
    },

    /// Repointing a `-latest` alias failed.
    #[error("updating alias {alias} for {file} failed: {reason}")]
    AliasUpdateError {
        /// Staged artifact filename.
        file: String,
        /// Remote alias path.
        alias: String,
        /// Description of the failure.
        reason: String,
    },

    /// The configured `host[:port]` string is malformed.
    #[error("invalid remote host {value:?}: {reason}")]
    InvalidRemoteHost {
        /// The rejected host string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The remote base directory cannot be passed safely to `ssh` and `scp`.
    #[error("invalid remote directory {value:?}: {reason}")]
    InvalidRemoteDir {
        /// The rejected directory.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The local release root has no directory name to mirror remotely.
    #[error("invalid release directory {path}: {reason}")]
    InvalidReleaseDir {
        /// The rejected release root.
        path: Utf8PathBuf,
        /// Description of the validation failure.
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration file {path}: {reason}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The current time does not fit in a signed 64-bit nanosecond timestamp.
    #[error("system clock is outside the representable timestamp range")]
    ClockOutOfRange,

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl PublisherError {
    /// Wrap an I/O error with the path it occurred on.
    #[must_use]
    pub fn io_at(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error. Every error is fatal, so this is
    /// always non-zero.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Result type alias using [`PublisherError`].
pub type Result<T> = std::result::Result<T, PublisherError>;
