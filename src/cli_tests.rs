//! Unit tests for CLI parsing and configuration precedence.

use super::Cli;
use crate::config::{BuildSection, FileConfig, RemoteSection};
use crate::error::PublisherError;
use camino::Utf8PathBuf;
use clap::Parser;
use rstest::rstest;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("relay-publisher").chain(args.iter().copied()))
        .expect("arguments parse")
}

#[test]
fn no_flags_yields_built_in_defaults() {
    let config = parse(&[])
        .resolve(&FileConfig::default())
        .expect("defaults resolve");

    assert!(!config.dry_run);
    assert_eq!(config.source_dir, Utf8PathBuf::from("../RelayClient"));
    assert_eq!(config.release_dir, Utf8PathBuf::from("downloads"));
    assert_eq!(config.version_override, None);
    assert_eq!(
        config.build_script,
        Utf8PathBuf::from("../RelayClient/build/build-all.sh")
    );
    assert_eq!(config.build_interpreter, "bash");
    assert_eq!(config.artifact_extension, "zip");
    assert_eq!(config.manifest_path, Utf8PathBuf::from("relayClient.json"));
    assert_eq!(config.remote.login(), "user@host.ext");
    assert_eq!(config.remote.base_dir, "/home/user/www/public_html");
}

#[test]
fn every_flag_is_parsed() {
    let cli = parse(&[
        "--dry-run",
        "--src-dir",
        "client",
        "--version",
        "1.2.3",
        "--host",
        "example.org:2222",
        "--user",
        "deploy",
        "--remote-dir",
        "/srv/www",
        "--json",
        "releases.json",
        "--config",
        "publisher.toml",
        "--build-script",
        "build.sh",
        "--release-dir",
        "out",
        "--extension",
        "tgz",
        "-vv",
    ]);

    assert!(cli.dry_run);
    assert_eq!(cli.config, Some(Utf8PathBuf::from("publisher.toml")));
    assert_eq!(cli.verbosity, 2);

    let config = cli.resolve(&FileConfig::default()).expect("flags resolve");
    assert_eq!(config.source_dir, Utf8PathBuf::from("client"));
    assert_eq!(config.version_override.as_deref(), Some("1.2.3"));
    assert_eq!(config.remote.host.port(), Some(2222));
    assert_eq!(config.remote.login(), "deploy@example.org");
    assert_eq!(config.remote.base_dir, "/srv/www");
    assert_eq!(config.manifest_path, Utf8PathBuf::from("releases.json"));
    assert_eq!(config.build_script, Utf8PathBuf::from("build.sh"));
    assert_eq!(config.release_dir, Utf8PathBuf::from("out"));
    assert_eq!(config.artifact_extension, "tgz");
}

#[test]
fn flags_override_the_file_and_the_file_overrides_defaults() {
    let file = FileConfig {
        source_dir: Some(Utf8PathBuf::from("from-file")),
        manifest: Some(Utf8PathBuf::from("file.json")),
        build: BuildSection {
            script: None,
            interpreter: Some("sh".to_owned()),
        },
        remote: RemoteSection {
            host: Some("file.example.org".to_owned()),
            user: Some("file-user".to_owned()),
            dir: None,
        },
        ..FileConfig::default()
    };
    let cli = parse(&["--src-dir", "from-flag", "--user", "flag-user"]);

    let config = cli.resolve(&file).expect("merge succeeds");

    assert_eq!(config.source_dir, Utf8PathBuf::from("from-flag"));
    assert_eq!(config.manifest_path, Utf8PathBuf::from("file.json"));
    assert_eq!(config.build_interpreter, "sh");
    assert_eq!(config.remote.login(), "flag-user@file.example.org");
    assert_eq!(config.remote.base_dir, "/home/user/www/public_html");
}

#[rstest]
#[case::bare("zip", "zip")]
#[case::leading_dot(".zip", "zip")]
#[case::other("tar.gz", "tar.gz")]
fn extension_is_normalised(#[case] flag: &str, #[case] expected: &str) {
    let config = parse(&["--extension", flag])
        .resolve(&FileConfig::default())
        .expect("extension resolves");
    assert_eq!(config.artifact_extension, expected);
}

#[test]
fn malformed_host_is_rejected_during_merge() {
    let err = parse(&["--host", "example.org:ssh"])
        .resolve(&FileConfig::default())
        .expect_err("bad port must fail");

    assert!(matches!(err, PublisherError::InvalidRemoteHost { .. }));
}

#[rstest]
#[case::root("/")]
#[case::parent("..")]
#[case::current(".")]
#[case::trailing_parent("out/..")]
fn release_dir_without_a_name_is_rejected(#[case] release_dir: &str) {
    let err = parse(&["--release-dir", release_dir])
        .resolve(&FileConfig::default())
        .expect_err("nameless release dir must fail");

    assert!(
        matches!(err, PublisherError::InvalidReleaseDir { ref path, .. } if path == release_dir),
        "{err:?}"
    );
}

#[rstest]
#[case::space("/srv/my site")]
#[case::substitution("/srv/$(whoami)")]
#[case::quote("/srv/it's")]
fn remote_dir_with_shell_characters_is_rejected(#[case] remote_dir: &str) {
    let err = parse(&["--remote-dir", remote_dir])
        .resolve(&FileConfig::default())
        .expect_err("unsafe remote dir must fail");

    assert!(matches!(err, PublisherError::InvalidRemoteDir { .. }), "{err:?}");
}

#[test]
fn dry_run_does_not_check_the_remote_dir() {
    let config = parse(&["--dry-run", "--remote-dir", "/srv/my site"])
        .resolve(&FileConfig::default())
        .expect("dry run never reaches the host");

    assert_eq!(config.remote.base_dir, "/srv/my site");
}

#[rstest]
#[case::verbose_and_quiet(&["-v", "-q"])]
#[case::empty_user(&["--user", ""])]
#[case::unknown_flag(&["--rollback"])]
fn invalid_arguments_are_rejected(#[case] args: &[&str]) {
    let argv = std::iter::once("relay-publisher").chain(args.iter().copied());
    assert!(Cli::try_parse_from(argv).is_err());
}

#[rstest]
#[case::quiet(Cli { quiet: true, ..Cli::default() }, "error")]
#[case::default(Cli::default(), "warn")]
#[case::verbose(Cli { verbosity: 1, ..Cli::default() }, "info")]
#[case::very_verbose(Cli { verbosity: 2, ..Cli::default() }, "debug")]
#[case::trace(Cli { verbosity: 5, ..Cli::default() }, "trace")]
fn log_filter_follows_verbosity(#[case] cli: Cli, #[case] expected: &str) {
    assert_eq!(cli.log_filter(), expected);
}
