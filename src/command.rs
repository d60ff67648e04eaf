use crate::constraint::ArgumentsConstraint;
use crate::context::Context;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// A command the shell can dispatch to by name.
///
/// The shell classifies the command line under [`Command::constraint`] before calling
/// [`Command::run`], so a handler can rely on the positional count and flag names it
/// declared. Commands may be run from a background thread, hence the `Send + Sync` bound.
pub trait Command: Send + Sync {
    /// Canonical name, e.g. "cat".
    fn name(&self) -> &str;

    /// One-line summary shown by `help`.
    fn description(&self) -> &str;

    /// Longer explanation shown by `help <command>`.
    fn long_description(&self) -> &str {
        ""
    }

    /// Usage line, e.g. "cat <file>...".
    fn usage(&self) -> &str;

    /// Other names that dispatch to this command.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    fn constraint(&self) -> &ArgumentsConstraint;

    /// Execute the command for one invocation.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode>;
}
