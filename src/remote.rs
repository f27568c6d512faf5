//! Publishing a staged release to the remote host.
//!
//! Publishing runs four steps in order, each over `ssh` or `scp`:
//!
//! 1. create the remote version directory (`mkdir -p`),
//! 2. copy each staged artifact into it,
//! 3. copy the manifest to the remote base directory,
//! 4. repoint each `<base>-latest.<ext>` symlink at the new artifact.
//!
//! The first failure stops the run. Nothing already copied or linked is
//! undone; every step is safe to repeat, so re-running the release is the
//! recovery path.

use crate::error::{PublisherError, Result};
use crate::executor::{CommandExecutor, describe_failure, display_command};
use crate::naming::alias_name;
use crate::stager::StagedArtifact;
use camino::Utf8Path;
use semver::Version;
use std::fmt;
use std::str::FromStr;

/// Default SSH host.
pub const DEFAULT_HOST: &str = "host.ext";

/// Default SSH user.
pub const DEFAULT_USER: &str = "user";

/// Default remote base directory.
pub const DEFAULT_BASE_DIR: &str = "/home/user/www/public_html";

/// An SSH host with an optional port, parsed from `host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHost {
    host: String,
    port: Option<u16>,
}

impl RemoteHost {
    /// Return the host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Return the explicit port, if one was given.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl Default for RemoteHost {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: None,
        }
    }
}

impl FromStr for RemoteHost {
    type Err = PublisherError;

    /// Parse `host` or `host:port`.
    ///
    /// A value with more than one `:` (such as a bare IPv6 address) is taken
    /// as a host with no port.
    fn from_str(value: &str) -> Result<Self> {
        let invalid = |reason: &str| PublisherError::InvalidRemoteHost {
            value: value.to_owned(),
            reason: reason.to_owned(),
        };

        let (host, port) = match value.split_once(':') {
            Some((host, port)) if !port.contains(':') => {
                let port = port
                    .parse::<u16>()
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or_else(|| invalid("port must be a number between 1 and 65535"))?;
                (host, Some(port))
            }
            _ => (value, None),
        };

        if host.is_empty() {
            return Err(invalid("host name is empty"));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(invalid("host name contains whitespace"));
        }
        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }
}

impl fmt::Display for RemoteHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.host),
            None => write!(f, "{}", self.host),
        }
    }
}

/// Where releases live on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    /// SSH host and optional port.
    pub host: RemoteHost,
    /// SSH user name.
    pub user: String,
    /// Remote base directory; the manifest is published here.
    pub base_dir: String,
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self {
            host: RemoteHost::default(),
            user: DEFAULT_USER.to_owned(),
            base_dir: DEFAULT_BASE_DIR.to_owned(),
        }
    }
}

impl RemoteLayout {
    /// Return the `user@host` login.
    #[must_use]
    pub fn login(&self) -> String {
        format!("{}@{}", self.user, self.host.host())
    }

    /// Return the remote directory holding version directories and aliases.
    #[must_use]
    pub fn release_root(&self, release_name: &str) -> String {
        format!("{}/{release_name}", self.base_dir.trim_end_matches('/'))
    }

    /// Return the remote directory for one version.
    #[must_use]
    pub fn version_dir(&self, release_name: &str, version: &Version) -> String {
        format!("{}/{version}", self.release_root(release_name))
    }

    fn ssh_args(&self, remote_command: String) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(port) = self.host.port() {
            args.extend(["-p".to_owned(), port.to_string()]);
        }
        args.extend([self.login(), remote_command]);
        args
    }

    /// The remote path is passed unquoted; legacy `scp` hands it to the
    /// remote shell, so base directories are checked by
    /// [`validate_remote_dir`] before a run.
    fn scp_args(&self, local: &Utf8Path, remote_dir: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(port) = self.host.port() {
            args.extend(["-P".to_owned(), port.to_string()]);
        }
        args.extend([local.to_string(), format!("{}:{remote_dir}", self.login())]);
        args
    }
}

/// Characters the remote shell would split or expand in an `scp` target.
const SHELL_SPECIAL: &[char] = &[
    '\'', '"', '`', '$', '\\', ';', '&', '|', '<', '>', '(', ')', '*', '?', '[', ']', '{', '}',
    '~', '#', '!',
];

/// Check that `dir` can be used as the remote base directory.
///
/// `ssh` commands quote their paths, but the `scp` destination is read by the
/// remote shell under legacy `scp`, so whitespace and shell metacharacters are
/// rejected outright.
///
/// # Errors
///
/// Returns [`PublisherError::InvalidRemoteDir`] if `dir` is empty or contains
/// whitespace or shell metacharacters.
///
/// # Examples
///
/// ```
/// use relay_publisher::remote::validate_remote_dir;
///
/// assert!(validate_remote_dir("/home/user/www/public_html").is_ok());
/// assert!(validate_remote_dir("/srv/my site").is_err());
/// ```
pub fn validate_remote_dir(dir: &str) -> Result<()> {
    let invalid = |reason: String| PublisherError::InvalidRemoteDir {
        value: dir.to_owned(),
        reason,
    };

    if dir.is_empty() {
        return Err(invalid("directory is empty".to_owned()));
    }
    if dir.chars().any(char::is_whitespace) {
        return Err(invalid("directory contains whitespace".to_owned()));
    }
    match dir.chars().find(|c| SHELL_SPECIAL.contains(c)) {
        Some(c) => Err(invalid(format!("directory contains shell character {c:?}"))),
        None => Ok(()),
    }
}

/// Quote `value` for a POSIX shell on the remote side.
///
/// # Examples
///
/// ```
/// use relay_publisher::remote::shell_quote;
///
/// assert_eq!(shell_quote("/srv/it's here"), r"'/srv/it'\''s here'");
/// ```
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Runs the remote half of a release.
pub struct RemotePublisher<'a> {
    layout: &'a RemoteLayout,
    release_name: &'a str,
    executor: &'a dyn CommandExecutor,
}

impl<'a> RemotePublisher<'a> {
    /// Create a publisher for `layout`.
    ///
    /// `release_name` is the directory under the remote base that holds
    /// version directories, mirroring the local release root's name.
    #[must_use]
    pub fn new(
        layout: &'a RemoteLayout,
        release_name: &'a str,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            layout,
            release_name,
            executor,
        }
    }

    /// Run every publishing step for `version`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails; later steps are not
    /// attempted.
    pub fn publish(
        &self,
        version: &Version,
        artifacts: &[StagedArtifact],
        manifest: &Utf8Path,
        extension: &str,
    ) -> Result<()> {
        self.ensure_dir(version)?;
        self.transfer_artifacts(version, artifacts)?;
        self.transfer_manifest(manifest)?;
        self.update_aliases(version, artifacts, extension)
    }

    /// Create the remote version directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::RemoteDirError`] if the command fails.
    pub fn ensure_dir(&self, version: &Version) -> Result<()> {
        let remote_dir = self.layout.version_dir(self.release_name, version);
        log::info!("creating {remote_dir} on {}", self.layout.host);
        let args = self
            .layout
            .ssh_args(format!("mkdir -p {}", shell_quote(&remote_dir)));
        self.run("ssh", &args)
            .map_err(|reason| PublisherError::RemoteDirError {
                host: self.layout.login(),
                remote_dir,
                reason,
            })
    }

    /// Copy each artifact into the remote version directory, in order.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::TransferError`] for the first artifact that
    /// fails to copy; the remaining artifacts are not attempted.
    pub fn transfer_artifacts(
        &self,
        version: &Version,
        artifacts: &[StagedArtifact],
    ) -> Result<()> {
        let remote_dir = self.layout.version_dir(self.release_name, version);
        artifacts
            .iter()
            .try_for_each(|artifact| self.transfer(&artifact.path, &remote_dir))
    }

    /// Copy the manifest into the remote base directory.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::TransferError`] if the copy fails.
    pub fn transfer_manifest(&self, manifest: &Utf8Path) -> Result<()> {
        self.transfer(manifest, &self.layout.base_dir)
    }

    /// Point each artifact's `-latest` alias at its versioned copy.
    ///
    /// Uses `ln -sfn`, which replaces an existing link in one step.
    /// Artifacts whose names do not carry `version` have no alias and are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::AliasUpdateError`] for the first alias that
    /// cannot be updated. Aliases updated before it are left in place.
    pub fn update_aliases(
        &self,
        version: &Version,
        artifacts: &[StagedArtifact],
        extension: &str,
    ) -> Result<()> {
        let root = self.layout.release_root(self.release_name);
        for artifact in artifacts {
            let Some(alias) = alias_name(&artifact.file_name, version, extension) else {
                log::warn!("{} has no versioned name, skipping alias", artifact.file_name);
                continue;
            };
            let target = format!("{root}/{version}/{}", artifact.file_name);
            let link = format!("{root}/{alias}");
            log::info!("pointing {link} at {target}");
            let args = self.layout.ssh_args(format!(
                "ln -sfn {} {}",
                shell_quote(&target),
                shell_quote(&link)
            ));
            self.run("ssh", &args)
                .map_err(|reason| PublisherError::AliasUpdateError {
                    file: artifact.file_name.clone(),
                    alias: link,
                    reason,
                })?;
        }
        Ok(())
    }

    fn transfer(&self, local: &Utf8Path, remote_dir: &str) -> Result<()> {
        log::info!("copying {local} to {}:{remote_dir}", self.layout.host);
        let args = self.layout.scp_args(local, remote_dir);
        self.run("scp", &args)
            .map_err(|reason| PublisherError::TransferError {
                file: local.to_owned(),
                host: self.layout.login(),
                remote_dir: remote_dir.to_owned(),
                reason,
            })
    }

    /// Run one command, reducing any failure to a description.
    fn run(&self, cmd: &str, args: &[String]) -> std::result::Result<(), String> {
        match self.executor.run(cmd, args) {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(format!(
                "`{}` {}",
                display_command(cmd, args),
                describe_failure(status)
            )),
            Err(e) => Err(format!("`{}` could not run: {e}", display_command(cmd, args))),
        }
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
