//! A small interactive shell with builtin commands and background subprocesses.
//!
//! Every command declares an [`ArgumentsConstraint`] describing the flags it understands and
//! how many positional arguments it takes. A typed line is turned into a [`Context`], which
//! classifies each token as positional or as a value of the most recent flag, then handed to
//! the matching [`Command`]. Lines naming no builtin are run as programs found in `PATH`.
//!
//! A trailing `%` runs the invocation in the background. Background programs are tracked by
//! the interpreter and can be suspended and resumed by pid.
//!
//! The main entry point is [`Interpreter`].

mod builtin;
pub mod command;
pub mod config;
pub mod constraint;
pub mod context;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod logging;
pub mod subprocess;
pub mod table;

pub use command::{Command, ExitCode};
pub use constraint::ArgumentsConstraint;
pub use context::Context;
pub use error::ShellError;
pub use interpreter::Interpreter;
