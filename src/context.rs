//! Parsed command invocations.
//!
//! A [`Context`] is produced by [`Context::get_context`], which classifies the tokens of a
//! command line into positional and named arguments under an [`ArgumentsConstraint`].
//! Contexts never change once built; every transformation returns a new one.

use crate::constraint::ArgumentsConstraint;
use crate::error::ShellError;
use crate::interpreter::Interpreter;
use crate::lexer;
use std::collections::BTreeMap;
use std::fmt;

/// Trailing token asking for an invocation to run without blocking the prompt.
pub const BACKGROUND_MARKER: char = '%';

/// Flag name to the tokens routed to it, the flag name itself first.
pub type NamedArgs = BTreeMap<String, Vec<String>>;

/// One parsed and validated command invocation.
///
/// For `args a b -c d e -g h` the tokens are every word, the positional arguments are
/// `[args, a, b]` and the named arguments are `{-c: [-c, d, e], -g: [-g, h]}`. A flag that
/// was not supplied has no entry.
#[derive(Clone)]
pub struct Context<'a> {
    message: String,
    tokens: Vec<String>,
    positional_args: Vec<String>,
    named_args: NamedArgs,
    interpreter: &'a Interpreter,
    constraint: &'a ArgumentsConstraint,
}

/// Where the next plain token goes while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Positional,
    InFlag(String),
}

/// Token classes that drive the scan.
enum TokenShape<'t> {
    /// `-`
    Dash,
    /// `-abc`, one flag per letter.
    Bundled(&'t str),
    /// `--long`
    Long,
    Plain,
}

impl<'t> TokenShape<'t> {
    fn of(token: &'t str) -> Self {
        if token == "-" {
            TokenShape::Dash
        } else if token.starts_with("--") {
            TokenShape::Long
        } else if let Some(letters) = token.strip_prefix('-') {
            TokenShape::Bundled(letters)
        } else {
            TokenShape::Plain
        }
    }
}

struct Classifier<'c> {
    constraint: &'c ArgumentsConstraint,
    state: ScanState,
    positional_args: Vec<String>,
    named_args: NamedArgs,
}

impl<'c> Classifier<'c> {
    fn new(constraint: &'c ArgumentsConstraint) -> Self {
        Self {
            constraint,
            state: ScanState::Positional,
            positional_args: Vec::new(),
            named_args: NamedArgs::new(),
        }
    }

    fn feed(&mut self, token: &str) -> Result<(), ShellError> {
        match TokenShape::of(token) {
            TokenShape::Dash => return Err(ShellError::RedirectionUnsupported),
            TokenShape::Bundled(letters) => {
                for letter in letters.chars() {
                    let name = format!("-{letter}");
                    if !letter.is_ascii_lowercase() {
                        return Err(ShellError::UnsupportedOption(name));
                    }
                    self.enter_flag(name)?;
                }
            }
            TokenShape::Long => self.enter_flag(token.to_string())?,
            TokenShape::Plain => self.append(token.to_string())?,
        }
        Ok(())
    }

    /// Flags never close: the new flag stays current until another one replaces it.
    fn enter_flag(&mut self, name: String) -> Result<(), ShellError> {
        self.state = ScanState::InFlag(name.clone());
        self.append(name)
    }

    fn append(&mut self, token: String) -> Result<(), ShellError> {
        match &self.state {
            ScanState::Positional => self.positional_args.push(token),
            ScanState::InFlag(flag) => {
                if self.constraint.checks_arguments() && !self.constraint.has_argument(flag) {
                    return Err(ShellError::UnknownArgument(flag.clone()));
                }
                self.named_args.entry(flag.clone()).or_default().push(token);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<(Vec<String>, NamedArgs), ShellError> {
        if self.constraint.checks_arguments() {
            let count = self.positional_args.len();
            let (min, max) = self.constraint.positional_bounds();
            if count < min {
                return Err(ShellError::TooFewArguments { count, min });
            }
            if count > max {
                return Err(ShellError::TooManyArguments { count, max });
            }
        }
        Ok((self.positional_args, self.named_args))
    }
}

impl<'a> Context<'a> {
    /// Tokenize `message` and classify it under `constraint`.
    pub fn get_context(
        interpreter: &'a Interpreter,
        message: &str,
        constraint: &'a ArgumentsConstraint,
    ) -> Result<Self, ShellError> {
        let tokens = lexer::split(message);

        let (positional_args, named_args) = if constraint.requires_parsing() {
            let mut classifier = Classifier::new(constraint);
            for token in &tokens {
                classifier.feed(token)?;
            }
            classifier.finish()?
        } else {
            (Vec::new(), NamedArgs::new())
        };

        Ok(Self {
            message: message.to_string(),
            tokens,
            positional_args,
            named_args,
            interpreter,
            constraint,
        })
    }

    /// The line exactly as it was typed.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Positional arguments, starting with the command token when it is not a flag.
    pub fn positional_args(&self) -> &[String] {
        &self.positional_args
    }

    pub fn named_args(&self) -> &NamedArgs {
        &self.named_args
    }

    /// Whether `flag` appeared on the line.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.named_args.contains_key(flag)
    }

    /// Values routed to `flag`, without the leading flag name.
    pub fn flag_values(&self, flag: &str) -> Option<&[String]> {
        self.named_args.get(flag).map(|values| &values[1..])
    }

    pub fn interpreter(&self) -> &'a Interpreter {
        self.interpreter
    }

    pub fn constraint(&self) -> &'a ArgumentsConstraint {
        self.constraint
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Classify the original message again under another constraint.
    pub fn parse(&self, constraint: &'a ArgumentsConstraint) -> Result<Self, ShellError> {
        Self::get_context(self.interpreter, &self.message, constraint)
    }

    /// Substitute the leading token, e.g. to turn an alias into the canonical command name.
    pub fn replace_call(&self, token: &str) -> Result<Self, ShellError> {
        let first = self.tokens.first().ok_or(ShellError::EmptyInvocation)?;

        let start = self.message.len() - self.message.trim_start().len();
        let mut message = String::with_capacity(self.message.len() + token.len());
        message.push_str(&self.message[..start]);
        message.push_str(token);
        message.push_str(&self.message[start + first.len()..]);

        let mut tokens = self.tokens.clone();
        tokens[0] = token.to_string();

        let mut positional_args = self.positional_args.clone();
        if let Some(call) = positional_args.first_mut() {
            *call = token.to_string();
        }

        Ok(Self {
            message,
            tokens,
            positional_args,
            named_args: self.named_args.clone(),
            interpreter: self.interpreter,
            constraint: self.constraint,
        })
    }

    pub fn is_background_request(&self) -> bool {
        self.tokens
            .last()
            .is_some_and(|last| last.len() == 1 && last.starts_with(BACKGROUND_MARKER))
    }

    /// Drop the trailing background marker and classify what is left again.
    pub fn strip_background_request(&self) -> Result<Self, ShellError> {
        if !self.is_background_request() {
            return Ok(self.copy());
        }

        let message = match self.message.rfind(BACKGROUND_MARKER) {
            Some(marker) => self.message[..marker].trim_end(),
            None => self.message.as_str(),
        };
        Self::get_context(self.interpreter, message, self.constraint)
    }
}

impl PartialEq for Context<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.tokens == other.tokens
            && self.positional_args == other.positional_args
            && self.named_args == other.named_args
            && std::ptr::eq(self.interpreter, other.interpreter)
            && self.constraint == other.constraint
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("message", &self.message)
            .field("tokens", &self.tokens)
            .field("positional_args", &self.positional_args)
            .field("named_args", &self.named_args)
            .finish_non_exhaustive()
    }
}
