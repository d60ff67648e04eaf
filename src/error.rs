use thiserror::Error;

/// Failures raised while declaring argument constraints or classifying a command line.
///
/// Every variant is terminal for the invocation that produced it: the dispatcher reports
/// the message to the user and the shell keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// A bare `-` token, which would mean reading from a pipe.
    #[error("input redirection is not supported")]
    RedirectionUnsupported,

    /// A bundled short flag contained something other than a lowercase ASCII letter.
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),

    /// A flag that the command's constraint does not know about.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("too few positional arguments: {count} (expected at least {min})")]
    TooFewArguments { count: usize, min: usize },

    #[error("too many positional arguments: {count} (expected at most {max})")]
    TooManyArguments { count: usize, max: usize },

    /// The same flag name was registered twice on one constraint.
    #[error("argument {0} already exists")]
    DuplicateArgument(String),

    #[error("lower bound {lower} is greater than upper bound {upper}")]
    InvertedBounds { lower: usize, upper: usize },

    /// A checking constraint must require at least the command token itself.
    #[error("lower bound of positional arguments must be at least 1")]
    ZeroPositionalLowerBound,

    /// Named arguments were registered on a constraint that never parses.
    #[error("constraint does not support context parsing")]
    ParsingDisabled,

    #[error("argument {0} does not exist")]
    NoSuchArgument(String),

    /// `replace_call` on an invocation without any token.
    #[error("no token to replace in an empty invocation")]
    EmptyInvocation,
}
