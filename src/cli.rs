//! CLI argument definitions for the release publisher.
//!
//! Flags left unset fall back to the configuration file and then to built-in
//! defaults; [`Cli::resolve`] performs that merge and produces the
//! [`PipelineConfig`] the pipeline runs with.

use crate::config::FileConfig;
use crate::error::Result;
use crate::pipeline::PipelineConfig;
use crate::remote::RemoteHost;
use crate::stager::DEFAULT_EXTENSION;
use camino::Utf8PathBuf;
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;

/// Build, stage, checksum and publish a versioned release.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "relay-publisher")]
#[command(about)]
#[command(long_about = concat!(
    "Build, stage, checksum and publish a versioned release.\n\n",
    "The next version is the highest version in the manifest with its patch ",
    "number bumped, unless --version is given. The build script is run with ",
    "that version, its archives are copied into <release-dir>/<version> under ",
    "versioned names, and the manifest records their SHA-256 digests. The ",
    "archives and manifest are then copied to the remote host with scp and ",
    "each <name>-latest alias is repointed at the new archive.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Release the next patch version:\n",
    "    $ relay-publisher --host downloads.example.org:2222 --user deploy\n\n",
    "  Release an explicit version without touching the remote host:\n",
    "    $ relay-publisher --version 1.4.0 --dry-run\n\n",
    "Settings may also be kept in relay-publisher.toml (see --config).",
))]
pub struct Cli {
    /// Build, stage and update the manifest, but do not publish.
    #[arg(long)]
    pub dry_run: bool,

    /// Directory scanned for archives [default: ../RelayClient].
    #[arg(long = "src-dir", value_name = "DIR")]
    pub source_dir: Option<Utf8PathBuf>,

    /// Release this version instead of bumping the patch number (format a.b.c).
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// SSH host, optionally with a port [default: host.ext].
    #[arg(long, value_name = "HOST[:PORT]")]
    pub host: Option<String>,

    /// SSH user name [default: user].
    #[arg(long, value_name = "USER", value_parser = NonEmptyStringValueParser::new())]
    pub user: Option<String>,

    /// Remote base directory [default: /home/user/www/public_html].
    #[arg(long = "remote-dir", value_name = "DIR", value_parser = NonEmptyStringValueParser::new())]
    pub remote_dir: Option<String>,

    /// Manifest file [default: relayClient.json].
    #[arg(long = "json", value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Configuration file [default: relay-publisher.toml, if present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Build script run with the new version [default: ../RelayClient/build/build-all.sh].
    #[arg(long, value_name = "FILE")]
    pub build_script: Option<Utf8PathBuf>,

    /// Local release root [default: downloads].
    #[arg(long, value_name = "DIR")]
    pub release_dir: Option<Utf8PathBuf>,

    /// Archive extension to publish [default: zip].
    #[arg(long, value_name = "EXT", value_parser = NonEmptyStringValueParser::new())]
    pub extension: Option<String>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Merge these flags with `file`, falling back to built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PublisherError::InvalidRemoteHost`] if the
    /// chosen host is not a valid `host[:port]`, or any error from
    /// [`PipelineConfig::validate`].
    pub fn resolve(&self, file: &FileConfig) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let mut remote = defaults.remote;
        if let Some(host) = self.host.as_ref().or(file.remote.host.as_ref()) {
            remote.host = host.parse::<RemoteHost>()?;
        }
        if let Some(user) = self.user.as_ref().or(file.remote.user.as_ref()) {
            remote.user.clone_from(user);
        }
        if let Some(dir) = self.remote_dir.as_ref().or(file.remote.dir.as_ref()) {
            remote.base_dir.clone_from(dir);
        }

        let extension = self
            .extension
            .as_deref()
            .or(file.extension.as_deref())
            .map_or_else(|| DEFAULT_EXTENSION.to_owned(), normalise_extension);

        let config = PipelineConfig {
            dry_run: self.dry_run,
            source_dir: pick(
                self.source_dir.as_ref(),
                file.source_dir.as_ref(),
                defaults.source_dir,
            ),
            release_dir: pick(
                self.release_dir.as_ref(),
                file.release_dir.as_ref(),
                defaults.release_dir,
            ),
            version_override: self.version.clone(),
            build_script: pick(
                self.build_script.as_ref(),
                file.build.script.as_ref(),
                defaults.build_script,
            ),
            build_interpreter: file
                .build
                .interpreter
                .clone()
                .unwrap_or(defaults.build_interpreter),
            artifact_extension: extension,
            manifest_path: pick(
                self.manifest.as_ref(),
                file.manifest.as_ref(),
                defaults.manifest_path,
            ),
            remote,
            quiet: self.quiet,
        };
        config.validate()?;
        Ok(config)
    }

    /// Default log filter for the chosen verbosity, used when `RUST_LOG` is
    /// unset.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// First of the flag and the file setting that is present, else `default`.
fn pick(
    flag: Option<&Utf8PathBuf>,
    file: Option<&Utf8PathBuf>,
    default: Utf8PathBuf,
) -> Utf8PathBuf {
    flag.or(file).cloned().unwrap_or(default)
}

/// Strip a leading dot so `.zip` and `zip` mean the same thing.
fn normalise_extension(extension: &str) -> String {
    let trimmed = extension.trim_start_matches('.');
    if trimmed.is_empty() {
        DEFAULT_EXTENSION.to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
