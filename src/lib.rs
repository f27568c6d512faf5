//! Release publisher library.
//!
//! This crate builds, stages, checksums and publishes versioned release
//! archives. Each run resolves the next semantic version, invokes an external
//! build script, copies the resulting archives into a version directory,
//! records them in a JSON manifest, and pushes everything to a remote host
//! over `ssh`/`scp`, repointing `-latest` aliases at the new files. It is used
//! by the `relay-publisher` binary and can be driven programmatically with a
//! custom [`executor::CommandExecutor`].
//!
//! # Modules
//!
//! - [`atomic_file`] - Whole-file replacement through a temporary file
//! - [`builder`] - External build script invocation
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Optional TOML configuration file
//! - [`error`] - Error taxonomy for release runs
//! - [`executor`] - Subprocess execution capability
//! - [`manifest`] - Release manifest model and persistence
//! - [`naming`] - Versioned and alias filenames
//! - [`output`] - Operator-facing progress lines
//! - [`pipeline`] - Release orchestration
//! - [`remote`] - Remote directory creation, transfer and alias updates
//! - [`sha256_digest`] - Validated SHA-256 digest strings
//! - [`stager`] - Artifact discovery, staging and checksumming
//! - [`version`] - Release version resolution

pub mod atomic_file;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod remote;
pub mod sha256_digest;
pub mod stager;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod version;
