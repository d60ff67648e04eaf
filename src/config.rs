//! Command-line options and the settings derived from them.

use argh::FromArgs;
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "liteshell> ";
pub const DEFAULT_LOG_FILTER: &str = "warn";
const HISTORY_FILE_NAME: &str = ".liteshell_history";

#[derive(FromArgs, Debug, Default, PartialEq)]
/// A small interactive shell with builtin commands and background jobs.
pub struct Options {
    #[argh(option, short = 'c')]
    /// run a single command line and exit with its status
    pub command: Option<String>,

    #[argh(switch)]
    /// do not read or write the history file
    pub no_history: bool,

    #[argh(option)]
    /// write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,

    #[argh(option)]
    /// text shown before each input line
    pub prompt: Option<String>,
}

/// Settings for one shell session.
///
/// Command-line options win over environment variables, which win over the defaults:
/// - `LITESHELL_PROMPT`: prompt text.
/// - `LITESHELL_LOG`: `tracing` filter directive, e.g. `liteshell=debug`.
/// - `HOME`: directory holding the history file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub command: Option<String>,
    pub prompt: String,
    pub history_file: Option<PathBuf>,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
}

impl ShellConfig {
    /// Resolve options against the process environment.
    pub fn from_options(options: Options) -> Self {
        Self::resolve(options, |key| std::env::var(key).ok())
    }

    /// Resolve options against variables provided by `lookup`.
    pub fn resolve(options: Options, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let prompt = options
            .prompt
            .or_else(|| lookup("LITESHELL_PROMPT"))
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        let history_file = if options.no_history {
            None
        } else {
            lookup("HOME").map(|home| PathBuf::from(home).join(HISTORY_FILE_NAME))
        };

        Self {
            command: options.command,
            prompt,
            history_file,
            log_filter: lookup("LITESHELL_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_file: options.log_file,
        }
    }
}
