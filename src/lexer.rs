//! Splitting a command line into tokens.

/// Split a command line into whitespace-delimited tokens.
///
/// Tokens are never empty. There is no quoting: `"a b"` yields two tokens.
pub fn split(message: &str) -> Vec<String> {
    message.split_whitespace().map(str::to_string).collect()
}
