//! Shared test utilities for the publisher crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! integration tests under `tests/`.

use crate::error::{PublisherError, Result};
use crate::executor::{CommandExecutor, display_command};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::ExitStatus;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "ssh").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<ExitStatus>,
}

impl ExpectedCall {
    /// Expect `cmd args...` and report that it exited with `code`.
    #[must_use]
    pub fn exiting(cmd: &str, args: &[&str], code: i32) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result: Ok(exit_status(code)),
        }
    }

    /// Expect `cmd args...` and report success.
    #[must_use]
    pub fn succeeding(cmd: &str, args: &[&str]) -> Self {
        Self::exiting(cmd, args, 0)
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Hands out predefined results for an exact sequence of expected command
/// invocations, so tests can drive the pipeline without spawning processes.
/// A call that does not match the next expectation yields
/// [`PublisherError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    seen: RefCell<Vec<String>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Command lines received so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }

    /// Number of expected calls not yet made.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.expected.borrow().len()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining: Vec<String> = self
            .expected
            .borrow()
            .iter()
            .map(|call| display_command(&call.cmd, &call.args))
            .collect();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, still waiting for {remaining:?}"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[String]) -> Result<ExitStatus> {
        let received = display_command(cmd, args);
        self.seen.borrow_mut().push(received.clone());

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(PublisherError::StubMismatch {
                message: format!("unexpected command invocation: {received}"),
            });
        };
        if call.cmd != cmd || call.args != args {
            return Err(PublisherError::StubMismatch {
                message: format!(
                    "expected `{}`, got `{received}`",
                    display_command(&call.cmd, &call.args)
                ),
            });
        }
        call.result
    }
}
