use crate::command::ExitCode;
use crate::context::Context;
use crate::env::Environment;
use crate::subprocess::{Subprocess, SubprocessRegistry};
use anyhow::Result;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A program found on disk that is not one of the shell's own commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<String>,
    command_line: String,
}

impl ExternalCommand {
    /// Resolve the leading token of `context` to an executable.
    ///
    /// Arguments are passed on exactly as tokenized; flags are left for the program to parse.
    pub fn resolve(env: &Environment, context: &Context<'_>) -> Option<Self> {
        let (name, args) = context.tokens().split_first()?;
        Self::find(env, name, args, context.message().trim())
    }

    /// Resolve `name` to an executable run with `args`.
    pub fn find(env: &Environment, name: &str, args: &[String], command_line: &str) -> Option<Self> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let program = find_command_path(OsStr::new(search_paths), env.current_dir(), Path::new(name))?;
        Some(Self {
            program,
            args: args.to_vec(),
            command_line: command_line.to_string(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Start the program and block until it exits.
    pub fn run_foreground(&self, env: &Environment) -> Result<ExitCode> {
        let mut process = self.spawn(env, false)?;
        process.wait()
    }

    /// Start the program and hand it to `registry`, returning its pid.
    pub fn run_background(
        &self,
        env: &Environment,
        registry: &SubprocessRegistry,
        suspended: bool,
    ) -> Result<u32> {
        let process = self.spawn(env, suspended)?;
        let pid = process.pid();
        registry.register(process);
        Ok(pid)
    }

    fn spawn(&self, env: &Environment, suspended: bool) -> Result<Subprocess> {
        Subprocess::spawn(&self.program, self.args.as_slice(), env, suspended, self.command_line.as_str())
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is a file.
/// - `./foo` or a relative path with several components (e.g. `bin/sh`): resolved against
///   `current_dir`.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, current_dir: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(std::path::Component::Normal(name)), None) => find_in_path(search_paths, name),
        _ => find_by_path(&current_dir.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| find_by_path(&dir.join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() { Some(path.to_path_buf()) } else { None }
}
