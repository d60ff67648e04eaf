//! Declarative description of what a command invocation may look like.

use crate::error::ShellError;
use std::collections::{BTreeMap, BTreeSet};

/// Lower and upper bound of a count, both inclusive.
pub type Bounds = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct NamedArgument {
    help: String,
    bounds: Bounds,
}

/// Rules a command declares for its command line.
///
/// A constraint is built once, when the command is constructed, and is only read afterwards.
/// It decides whether a line is classified at all, whether unknown flags and the number of
/// positional arguments are validated, and keeps the help text of every flag the command
/// understands.
///
/// Positional arguments include the command token itself: `resume 42` has two.
///
/// ```
/// use liteshell::ArgumentsConstraint;
///
/// let mut constraint = ArgumentsConstraint::checked(1, 2).unwrap();
/// constraint
///     .add_argument_aliases(&["-a", "--all"], "include hidden entries", 0, 0)
///     .unwrap();
/// assert!(constraint.has_argument("--all"));
/// assert_eq!(constraint.alias_groups().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentsConstraint {
    requires_parsing: bool,
    checks_arguments: bool,
    positional_bounds: Bounds,
    named: BTreeMap<String, NamedArgument>,
    alias_groups: BTreeSet<BTreeSet<String>>,
}

impl ArgumentsConstraint {
    fn build(requires_parsing: bool, checks_arguments: bool, positional_bounds: Bounds) -> Self {
        Self {
            requires_parsing,
            checks_arguments,
            positional_bounds,
            named: BTreeMap::new(),
            alias_groups: BTreeSet::new(),
        }
    }

    /// A constraint under which the line is never classified.
    ///
    /// Contexts built with it keep their tokens but have no positional or named arguments.
    pub fn no_parsing() -> Self {
        Self::build(false, false, (0, 0))
    }

    /// Classify the line but accept any flag and any number of positional arguments.
    pub fn unchecked() -> Self {
        Self::build(true, false, (0, 0))
    }

    /// Classify the line and reject unknown flags and positional counts outside `min..=max`.
    ///
    /// Fails when `min > max` or when `min == 0`.
    pub fn checked(min: usize, max: usize) -> Result<Self, ShellError> {
        if min > max {
            return Err(ShellError::InvertedBounds {
                lower: min,
                upper: max,
            });
        }
        if min == 0 {
            return Err(ShellError::ZeroPositionalLowerBound);
        }
        Ok(Self::build(true, true, (min, max)))
    }

    pub fn requires_parsing(&self) -> bool {
        self.requires_parsing
    }

    pub fn checks_arguments(&self) -> bool {
        self.checks_arguments
    }

    /// Bounds on the number of positional arguments, including the command token.
    ///
    /// Only meaningful when both parsing and checking are enabled.
    pub fn positional_bounds(&self) -> Bounds {
        self.positional_bounds
    }

    /// Register one named argument in its own alias group.
    ///
    /// `value_min`/`value_max` describe how many values the flag takes. They are kept for
    /// help output and are not enforced while classifying a line.
    pub fn add_argument(
        &mut self,
        name: &str,
        help: &str,
        value_min: usize,
        value_max: usize,
    ) -> Result<&mut Self, ShellError> {
        self.add_argument_aliases(&[name], help, value_min, value_max)
    }

    /// Register several interchangeable spellings of one flag.
    ///
    /// Each alias gets its own slot with the same help and bounds, and the whole set is
    /// recorded as one alias group. Nothing is registered when any alias is rejected.
    pub fn add_argument_aliases(
        &mut self,
        aliases: &[&str],
        help: &str,
        value_min: usize,
        value_max: usize,
    ) -> Result<&mut Self, ShellError> {
        if !self.requires_parsing {
            return Err(ShellError::ParsingDisabled);
        }
        if value_min > value_max {
            return Err(ShellError::InvertedBounds {
                lower: value_min,
                upper: value_max,
            });
        }

        let mut group = BTreeSet::new();
        for alias in aliases {
            if self.has_argument(alias) || !group.insert(alias.to_string()) {
                return Err(ShellError::DuplicateArgument(alias.to_string()));
            }
        }

        for alias in &group {
            self.named.insert(
                alias.clone(),
                NamedArgument {
                    help: help.to_string(),
                    bounds: (value_min, value_max),
                },
            );
        }
        if !group.is_empty() {
            self.alias_groups.insert(group);
        }

        Ok(self)
    }

    /// Whether `name` (e.g. `-v`) is a registered flag.
    pub fn has_argument(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    pub fn help(&self, name: &str) -> Result<&str, ShellError> {
        self.lookup(name).map(|arg| arg.help.as_str())
    }

    pub fn bounds(&self, name: &str) -> Result<Bounds, ShellError> {
        self.lookup(name).map(|arg| arg.bounds)
    }

    /// Flag names grouped by synonyms, for help rendering.
    pub fn alias_groups(&self) -> &BTreeSet<BTreeSet<String>> {
        &self.alias_groups
    }

    fn lookup(&self, name: &str) -> Result<&NamedArgument, ShellError> {
        self.named
            .get(name)
            .ok_or_else(|| ShellError::NoSuchArgument(name.to_string()))
    }
}
