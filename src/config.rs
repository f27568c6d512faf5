//! Optional configuration file.
//!
//! Settings that rarely change between releases (remote host, build script
//! location and so on) can live in a TOML file instead of being repeated on
//! every invocation. Every key is optional; command-line flags override the
//! file, and built-in defaults fill whatever neither supplies.
//!
//! ```toml
//! source_dir = "../RelayClient"
//! manifest = "relayClient.json"
//!
//! [build]
//! script = "../RelayClient/build/build-all.sh"
//!
//! [remote]
//! host = "downloads.example.org:2222"
//! user = "deploy"
//! dir = "/srv/www/public_html"
//! ```

use crate::error::{PublisherError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Configuration file read from the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "relay-publisher.toml";

/// Contents of the configuration file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Directory scanned for build outputs.
    pub source_dir: Option<Utf8PathBuf>,
    /// Local release root that version directories are created under.
    pub release_dir: Option<Utf8PathBuf>,
    /// Manifest file path.
    pub manifest: Option<Utf8PathBuf>,
    /// Archive extension, without the leading dot.
    pub extension: Option<String>,
    /// Build script settings.
    pub build: BuildSection,
    /// Remote host settings.
    pub remote: RemoteSection,
}

/// `[build]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Path to the build script.
    pub script: Option<Utf8PathBuf>,
    /// Program used to run the build script.
    pub interpreter: Option<String>,
}

/// `[remote]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSection {
    /// SSH host, optionally with `:port`.
    pub host: Option<String>,
    /// SSH user name.
    pub user: Option<String>,
    /// Remote base directory.
    pub dir: Option<String>,
}

impl FileConfig {
    /// Parse the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::InvalidConfig`] if the file cannot be read,
    /// is not valid TOML, or contains unknown keys.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| PublisherError::InvalidConfig {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        toml::from_str(&contents).map_err(|e| PublisherError::InvalidConfig {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Load the configuration the operator asked for.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read from `working_dir` if present; otherwise every setting is unset.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::InvalidConfig`] if the chosen file cannot be
    /// loaded.
    pub fn discover(explicit: Option<&Utf8Path>, working_dir: &Utf8Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = working_dir.join(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            log::debug!("reading configuration from {default_path}");
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir is UTF-8")
    }

    #[rstest]
    fn empty_file_leaves_everything_unset() {
        let config = toml::from_str::<FileConfig>("").expect("empty config parses");
        assert_eq!(config, FileConfig::default());
    }

    #[rstest]
    fn deserialises_every_section() {
        let source = concat!(
            "source_dir = \"../RelayClient\"\n",
            "release_dir = \"out/downloads\"\n",
            "manifest = \"relayClient.json\"\n",
            "extension = \"tar.gz\"\n",
            "[build]\n",
            "script = \"build.sh\"\n",
            "interpreter = \"sh\"\n",
            "[remote]\n",
            "host = \"example.org:2222\"\n",
            "user = \"deploy\"\n",
            "dir = \"/srv/www\"\n",
        );

        let config = toml::from_str::<FileConfig>(source)
            .expect("expected configuration to parse successfully");

        assert_eq!(config.source_dir.as_deref(), Some(Utf8Path::new("../RelayClient")));
        assert_eq!(config.release_dir.as_deref(), Some(Utf8Path::new("out/downloads")));
        assert_eq!(config.extension.as_deref(), Some("tar.gz"));
        assert_eq!(config.build.interpreter.as_deref(), Some("sh"));
        assert_eq!(config.remote.host.as_deref(), Some("example.org:2222"));
        assert_eq!(config.remote.user.as_deref(), Some("deploy"));
        assert_eq!(config.remote.dir.as_deref(), Some("/srv/www"));
    }

    #[rstest]
    #[case::top_level("dry_run = true\n")]
    #[case::nested("[remote]\npassword = \"hunter2\"\n")]
    fn rejects_unknown_keys(#[case] source: &str) {
        assert!(toml::from_str::<FileConfig>(source).is_err());
    }

    #[test]
    fn load_reports_the_offending_path() {
        let dir = TempDir::new().expect("create temp dir");
        let path = utf8_dir(&dir).join("relay-publisher.toml");
        std::fs::write(&path, "source_dir = [").expect("write config");

        let err = FileConfig::load(&path).expect_err("invalid TOML must fail");

        assert!(matches!(err, PublisherError::InvalidConfig { path: ref p, .. } if *p == path));
    }

    #[test]
    fn discover_without_file_uses_defaults() {
        let dir = TempDir::new().expect("create temp dir");

        let config = FileConfig::discover(None, &utf8_dir(&dir)).expect("no file is fine");

        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn discover_reads_default_file_from_working_dir() {
        let dir = TempDir::new().expect("create temp dir");
        let root = utf8_dir(&dir);
        std::fs::write(root.join(DEFAULT_CONFIG_FILE), "[remote]\nuser = \"deploy\"\n")
            .expect("write config");

        let config = FileConfig::discover(None, &root).expect("default file loads");

        assert_eq!(config.remote.user.as_deref(), Some("deploy"));
    }

    #[test]
    fn discover_requires_explicit_file_to_exist() {
        let dir = TempDir::new().expect("create temp dir");
        let root = utf8_dir(&dir);
        let missing = root.join("missing.toml");

        let err = FileConfig::discover(Some(&missing), &root).expect_err("missing file fails");

        assert!(matches!(err, PublisherError::InvalidConfig { .. }));
    }
}
