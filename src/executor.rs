//! Subprocess execution capability.
//!
//! The build script and every remote operation run through
//! [`CommandExecutor`], so the pipeline can be driven by a scripted executor
//! in tests instead of spawning `bash`, `ssh` or `scp`.

use crate::error::Result;
use std::process::{Command, ExitStatus};

/// Runs an external command to completion.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `cmd` with `args`, inheriting the operator's terminal, and returns
    /// its exit status once it finishes.
    ///
    /// Stdio is inherited rather than captured so build output streams live
    /// and `ssh` can prompt for credentials.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning the command. A command
    /// that runs but exits non-zero is reported through the returned status.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use relay_publisher::executor::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let status = executor.run("ssh", &["-V".to_owned()])?;
    /// assert!(status.success());
    /// # Ok::<(), relay_publisher::error::PublisherError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[String]) -> Result<ExitStatus>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[String]) -> Result<ExitStatus> {
        log::debug!("running {}", display_command(cmd, args));
        let status = Command::new(cmd).args(args).status()?;
        log::debug!("{cmd} finished with {status}");
        Ok(status)
    }
}

/// Render a command line for logs and error messages.
#[must_use]
pub fn display_command(cmd: &str, args: &[String]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Describe a non-zero exit status for an error message.
///
/// Distinguishes an exit code from termination by signal, which has no code.
#[must_use]
pub fn describe_failure(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::exit_status;
    use rstest::rstest;

    #[test]
    fn display_command_joins_program_and_arguments() {
        let args = vec!["-p".to_owned(), "2222".to_owned(), "user@host".to_owned()];
        assert_eq!(display_command("ssh", &args), "ssh -p 2222 user@host");
    }

    #[test]
    fn display_command_without_arguments_is_the_program() {
        assert_eq!(display_command("scp", &[]), "scp");
    }

    #[rstest]
    #[case::one(1, "exited with status 1")]
    #[case::two_five_five(255, "exited with status 255")]
    fn describe_failure_reports_exit_code(#[case] code: i32, #[case] expected: &str) {
        assert_eq!(describe_failure(exit_status(code)), expected);
    }

    #[cfg(unix)]
    #[test]
    fn describe_failure_reports_signal_termination() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait status 9 is "killed by SIGKILL".
        assert_eq!(
            describe_failure(ExitStatus::from_raw(9)),
            "terminated by signal"
        );
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_reports_exit_status() {
        let executor = SystemCommandExecutor;
        let ok = executor
            .run("sh", &["-c".to_owned(), "exit 0".to_owned()])
            .expect("sh is available");
        let failed = executor
            .run("sh", &["-c".to_owned(), "exit 3".to_owned()])
            .expect("sh is available");

        assert!(ok.success());
        assert_eq!(failed.code(), Some(3));
    }

    #[test]
    fn system_executor_surfaces_spawn_errors() {
        let executor = SystemCommandExecutor;
        let result = executor.run("relay-publisher-no-such-program", &[]);
        assert!(result.is_err());
    }
}
