//! External build invocation.
//!
//! Release archives are produced by an external build script that takes the
//! release version as its only argument. This module checks that the script
//! exists and runs it synchronously through a [`CommandExecutor`].

use crate::error::{PublisherError, Result};
use crate::executor::{CommandExecutor, describe_failure};
use camino::Utf8PathBuf;
use semver::Version;

/// Default location of the build script, relative to the working directory.
pub const DEFAULT_BUILD_SCRIPT: &str = "../RelayClient/build/build-all.sh";

/// Default interpreter used to run the build script.
pub const DEFAULT_BUILD_INTERPRETER: &str = "bash";

/// Configuration for the build step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Path to the build script.
    pub script: Utf8PathBuf,
    /// Program that runs the script (e.g. `bash`).
    pub interpreter: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            script: Utf8PathBuf::from(DEFAULT_BUILD_SCRIPT),
            interpreter: DEFAULT_BUILD_INTERPRETER.to_owned(),
        }
    }
}

/// Runs the external build script for a release.
#[derive(Debug, Clone)]
pub struct Builder {
    config: BuildConfig,
}

impl Builder {
    /// Create a new builder with the given configuration.
    #[must_use]
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Run the build script for `version` and wait for it to finish.
    ///
    /// The script's output goes straight to the operator's terminal. Nothing
    /// is cleaned up if it fails.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::BuildScriptMissing`] if the script does not
    /// exist, [`PublisherError::BuildFailed`] if it exits non-zero, or an I/O
    /// error if the interpreter cannot be spawned.
    pub fn build(&self, version: &Version, executor: &dyn CommandExecutor) -> Result<()> {
        let script = &self.config.script;
        if !script.is_file() {
            return Err(PublisherError::BuildScriptMissing {
                path: script.clone(),
            });
        }

        let args = [script.to_string(), version.to_string()];
        log::info!("running build script {script} for version {version}");
        let status = executor.run(&self.config.interpreter, &args)?;
        if status.success() {
            Ok(())
        } else {
            Err(PublisherError::BuildFailed {
                script: script.clone(),
                version: version.to_string(),
                status: describe_failure(status),
            })
        }
    }
}
