//! Release pipeline orchestration.
//!
//! A release runs strictly in sequence: resolve the version, run the build,
//! stage and checksum the artifacts, record the release in the manifest, and
//! publish to the remote host. The first error ends the run; nothing already
//! done is rolled back.

use crate::builder::{BuildConfig, Builder, DEFAULT_BUILD_INTERPRETER, DEFAULT_BUILD_SCRIPT};
use crate::error::{PublisherError, Result};
use crate::executor::CommandExecutor;
use crate::manifest::{self, ArtifactLink, ReleaseEntry};
use crate::output::{success_message, write_stderr_line};
use crate::remote::{RemoteLayout, RemotePublisher, validate_remote_dir};
use crate::stager::{self, DEFAULT_EXTENSION, DEFAULT_RELEASE_DIR, StagedArtifact, Stager};
use crate::version;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use semver::Version;
use std::io::Write;

/// Default directory scanned for build outputs.
pub const DEFAULT_SOURCE_DIR: &str = "../RelayClient";

/// Default manifest file.
pub const DEFAULT_MANIFEST: &str = "relayClient.json";

/// Everything a release run needs, fixed before the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Stop after the manifest is saved locally; nothing is sent to the host.
    pub dry_run: bool,
    /// Directory scanned for build outputs.
    pub source_dir: Utf8PathBuf,
    /// Local release root; artifacts are staged into `<release_dir>/<version>`.
    pub release_dir: Utf8PathBuf,
    /// Version to release instead of bumping the manifest's highest version.
    pub version_override: Option<String>,
    /// Build script run before staging.
    pub build_script: Utf8PathBuf,
    /// Program that runs the build script.
    pub build_interpreter: String,
    /// Extension of the build outputs to publish, without the leading dot.
    pub artifact_extension: String,
    /// Local manifest file.
    pub manifest_path: Utf8PathBuf,
    /// Remote host and directory layout.
    pub remote: RemoteLayout,
    /// Suppress progress lines.
    pub quiet: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            source_dir: Utf8PathBuf::from(DEFAULT_SOURCE_DIR),
            release_dir: Utf8PathBuf::from(DEFAULT_RELEASE_DIR),
            version_override: None,
            build_script: Utf8PathBuf::from(DEFAULT_BUILD_SCRIPT),
            build_interpreter: DEFAULT_BUILD_INTERPRETER.to_owned(),
            artifact_extension: DEFAULT_EXTENSION.to_owned(),
            manifest_path: Utf8PathBuf::from(DEFAULT_MANIFEST),
            remote: RemoteLayout::default(),
            quiet: false,
        }
    }
}

impl PipelineConfig {
    /// Name of the directory that holds version directories, locally and on
    /// the remote host.
    ///
    /// Falls back to the default name for a release root without one; such
    /// roots are rejected by [`PipelineConfig::validate`].
    #[must_use]
    pub fn release_name(&self) -> &str {
        self.release_dir.file_name().unwrap_or(DEFAULT_RELEASE_DIR)
    }

    /// Check the settings that would otherwise make the local and remote
    /// layouts disagree.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::InvalidReleaseDir`] if `release_dir` has no
    /// final directory name (`/`, `.` or `..`), or
    /// [`PublisherError::InvalidRemoteDir`] if the remote base directory is
    /// unsafe to pass to `scp`.
    pub fn validate(&self) -> Result<()> {
        if self.release_dir.file_name().is_none() {
            return Err(PublisherError::InvalidReleaseDir {
                path: self.release_dir.clone(),
                reason: "path must end in a directory name".to_owned(),
            });
        }
        if !self.dry_run {
            validate_remote_dir(&self.remote.base_dir)?;
        }
        Ok(())
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// The released version.
    pub version: Version,
    /// Local directory the artifacts were staged into.
    pub version_dir: Utf8PathBuf,
    /// Staged filenames, in staging order.
    pub files: Vec<String>,
    /// Whether the release was sent to the remote host.
    pub published: bool,
}

/// Drives one release from version resolution to remote publication.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    executor: &'a dyn CommandExecutor,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline that runs subprocesses through `executor`.
    #[must_use]
    pub fn new(config: PipelineConfig, executor: &'a dyn CommandExecutor) -> Self {
        Self { config, executor }
    }

    /// Run the release.
    ///
    /// Progress lines are written to `stderr` unless the configuration is
    /// quiet. In dry-run mode every step up to and including saving the
    /// manifest is performed, and nothing is sent to the remote host.
    ///
    /// # Errors
    ///
    /// Returns the error from [`PipelineConfig::validate`] before anything is
    /// touched, then the first error raised by any step. Steps already
    /// completed are not undone.
    pub fn run(&self, stderr: &mut dyn Write) -> Result<ReleaseReport> {
        let config = &self.config;
        config.validate()?;
        let stager = Stager::new(
            config.source_dir.clone(),
            config.release_dir.clone(),
            &config.artifact_extension,
        );
        stager.prepare()?;

        let entries = manifest::load(&config.manifest_path)?;
        let version = version::resolve(config.version_override.as_deref(), &entries)?;
        log::info!("releasing version {version}");

        self.progress(stderr, format!("Building version {version}..."));
        Builder::new(BuildConfig {
            script: config.build_script.clone(),
            interpreter: config.build_interpreter.clone(),
        })
        .build(&version, self.executor)?;

        let version_dir = stager.version_dir(&version);
        let staged = stager.stage(&version)?;
        self.progress(
            stderr,
            format!("Staged {} artifact(s) in {version_dir}", staged.len()),
        );

        let entry = ReleaseEntry {
            version: version.to_string(),
            timestamp: timestamp_nanos(Utc::now())?,
            links: link_artifacts(&staged)?,
        };
        manifest::save(&config.manifest_path, &manifest::upsert(&entries, entry))?;
        log::info!("recorded version {version} in {}", config.manifest_path);

        if config.dry_run {
            log::info!("dry run, skipping remote publication");
        } else {
            self.progress(
                stderr,
                format!("Publishing to {}...", config.remote.login()),
            );
            RemotePublisher::new(&config.remote, config.release_name(), self.executor).publish(
                &version,
                &staged,
                &config.manifest_path,
                &config.artifact_extension,
            )?;
        }

        self.progress(
            stderr,
            success_message(&version, &version_dir, staged.len(), config.dry_run),
        );
        Ok(ReleaseReport {
            version,
            version_dir,
            files: staged.into_iter().map(|artifact| artifact.file_name).collect(),
            published: !config.dry_run,
        })
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl std::fmt::Display) {
        if !self.config.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

/// Checksum each staged artifact and build its manifest link.
fn link_artifacts(staged: &[StagedArtifact]) -> Result<Vec<ArtifactLink>> {
    staged
        .iter()
        .map(|artifact| {
            Ok(ArtifactLink {
                link: link_path(&artifact.path),
                sha256: stager::checksum(&artifact.path)?,
            })
        })
        .collect()
}

/// Render a staged path with `/` separators regardless of platform.
fn link_path(path: &Utf8Path) -> String {
    path.as_str().replace(std::path::MAIN_SEPARATOR, "/")
}

/// Nanoseconds since the Unix epoch for `now`.
///
/// # Errors
///
/// Returns [`PublisherError::ClockOutOfRange`] outside the years 1677 to 2262.
pub fn timestamp_nanos(now: DateTime<Utc>) -> Result<i64> {
    now.timestamp_nanos_opt()
        .ok_or(PublisherError::ClockOutOfRange)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
