use crate::builtin;
use crate::command::{Command, ExitCode};
use crate::config::ShellConfig;
use crate::constraint::ArgumentsConstraint;
use crate::context::Context;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::subprocess::SubprocessRegistry;
use anyhow::{Result, anyhow};
use parking_lot::{Mutex, RwLock};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// An interactive shell: command table, environment and background subprocesses.
///
/// Every line is first split without classification to find the command name and the
/// background marker, then classified under the constraint of the command it dispatches
/// to. Names that are not commands are looked up as executables in `PATH` and receive
/// their tokens untouched.
///
/// Example
/// ```
/// use liteshell::Interpreter;
/// use std::sync::Arc;
///
/// let sh = Arc::new(Interpreter::with_builtins().unwrap());
/// let mut out = Vec::new();
/// let code = sh.execute_line("echo hello world", &mut out).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(String::from_utf8(out).unwrap(), "hello world\n");
/// ```
pub struct Interpreter {
    environment: RwLock<Environment>,
    subprocesses: SubprocessRegistry,
    commands: Vec<Arc<dyn Command>>,
    names: HashMap<String, usize>,
    dispatch: ArgumentsConstraint,
    exit_code: Mutex<Option<ExitCode>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Interpreter {
    /// Create a shell with a custom set of commands.
    ///
    /// When two commands claim the same name or alias, the first one wins.
    pub fn new(commands: Vec<Arc<dyn Command>>) -> Self {
        let mut names = HashMap::new();
        for (index, command) in commands.iter().enumerate() {
            names.entry(command.name().to_string()).or_insert(index);
            for alias in command.aliases() {
                names.entry(alias.to_string()).or_insert(index);
            }
        }

        Self {
            environment: RwLock::new(Environment::from_process()),
            subprocesses: SubprocessRegistry::default(),
            commands,
            names,
            dispatch: ArgumentsConstraint::no_parsing(),
            exit_code: Mutex::new(None),
            background: Mutex::new(Vec::new()),
        }
    }

    /// Create a shell with every builtin command.
    pub fn with_builtins() -> Result<Self, ShellError> {
        Ok(Self::new(builtin::all()?))
    }

    pub fn environment(&self) -> &RwLock<Environment> {
        &self.environment
    }

    pub fn subprocesses(&self) -> &SubprocessRegistry {
        &self.subprocesses
    }

    pub fn commands(&self) -> &[Arc<dyn Command>] {
        &self.commands
    }

    /// Look a command up by name or alias.
    pub fn find_command(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.names.get(name).map(|&index| &self.commands[index])
    }

    /// Ask the interactive loop to stop after the current line.
    pub fn request_exit(&self, code: ExitCode) {
        *self.exit_code.lock() = Some(code);
    }

    pub fn exit_requested(&self) -> Option<ExitCode> {
        *self.exit_code.lock()
    }

    /// Parse and run one command line.
    ///
    /// Output of builtins goes to `stdout`; external programs inherit the process streams.
    /// A line ending in `%` runs without waiting and returns 0 once it has started.
    pub fn execute_line(self: &Arc<Self>, line: &str, stdout: &mut dyn Write) -> Result<ExitCode> {
        let context = Context::get_context(self, line, &self.dispatch)?;
        let background = context.is_background_request();
        let context = context.strip_background_request()?;
        let Some(name) = context.tokens().first().cloned() else {
            return Ok(0);
        };
        debug!(
            command = %name,
            background,
            tokens = ?context.tokens(),
            "dispatching"
        );

        if let Some(command) = self.find_command(&name) {
            let context = if name == command.name() {
                context
            } else {
                context.replace_call(command.name())?
            };
            let context = context.parse(command.constraint())?;
            if background {
                return self.run_in_background(Arc::clone(command), context.message(), stdout);
            }
            return command.run(&context, stdout);
        }

        let env = self.environment.read().clone();
        let external = ExternalCommand::resolve(&env, &context)
            .ok_or_else(|| anyhow!("command not found: {}", name))?;
        if background {
            let pid = external.run_background(&env, &self.subprocesses, false)?;
            writeln!(stdout, "[{}] {}", pid, context.message().trim())?;
            Ok(0)
        } else {
            external.run_foreground(&env)
        }
    }

    /// Run a line, reporting failures on stderr instead of returning them.
    pub fn execute_reporting(self: &Arc<Self>, line: &str, stdout: &mut dyn Write) -> ExitCode {
        match self.execute_line(line, stdout) {
            Ok(code) => code,
            Err(e) => {
                warn!(line, error = %e, "command failed");
                eprintln!("error: {:#}", e);
                1
            }
        }
    }

    fn run_in_background(
        self: &Arc<Self>,
        command: Arc<dyn Command>,
        message: &str,
        stdout: &mut dyn Write,
    ) -> Result<ExitCode> {
        let shell = Arc::clone(self);
        let message = message.to_string();
        let name = command.name().to_string();

        let handle = std::thread::Builder::new()
            .name(format!("liteshell-{}", name))
            .spawn(move || {
                let result = Context::get_context(&shell, &message, command.constraint())
                    .map_err(anyhow::Error::from)
                    .and_then(|context| command.run(&context, &mut std::io::stdout()));
                match result {
                    Ok(code) => debug!(command = %command.name(), code, "background command finished"),
                    Err(e) => {
                        warn!(command = %command.name(), error = %e, "background command failed");
                        eprintln!("error: {}: {:#}", command.name(), e);
                    }
                }
            })?;

        let mut background = self.background.lock();
        background.retain(|handle| !handle.is_finished());
        background.push(handle);
        drop(background);

        writeln!(stdout, "[background] {}", name)?;
        Ok(0)
    }

    /// Block until every background builtin started so far has finished.
    ///
    /// Background subprocesses are not waited for; they outlive the shell.
    pub fn wait_background(&self) {
        let handles = std::mem::take(&mut *self.background.lock());
        for handle in handles {
            if handle.join().is_err() {
                warn!("background command panicked");
            }
        }
    }

    /// Read-eval-print loop on the terminal until `exit` or end of input.
    ///
    /// Returns the code passed to `exit`, or the status of the last line.
    pub fn run_repl(self: &Arc<Self>, config: &ShellConfig) -> Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;
        if let Some(path) = &config.history_file {
            if let Err(e) = rl.load_history(path) {
                debug!(path = %path.display(), error = %e, "no history loaded");
            }
        }

        let mut last = 0;
        while self.exit_requested().is_none() {
            match rl.readline(&config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    let mut stdout = std::io::stdout();
                    last = self.execute_reporting(&line, &mut stdout);
                    stdout.flush()?;
                    for (pid, code) in self.subprocesses.reap()? {
                        println!("[{}] exited with status {}", pid, code);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(path) = &config.history_file {
            if let Err(e) = rl.save_history(path) {
                warn!(path = %path.display(), error = %e, "failed to save history");
            }
        }
        Ok(self.exit_requested().unwrap_or(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    struct Recorder {
        constraint: ArgumentsConstraint,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Command for Recorder {
        fn name(&self) -> &str {
            "record"
        }

        fn description(&self) -> &str {
            "print what the command saw"
        }

        fn usage(&self) -> &str {
            "record <arg> [-v]"
        }

        fn aliases(&self) -> &[&str] {
            &["rec"]
        }

        fn constraint(&self) -> &ArgumentsConstraint {
            &self.constraint
        }

        fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
            self.calls.lock().push(context.message().to_string());
            writeln!(
                stdout,
                "{} {:?} {}",
                context.message(),
                context.positional_args(),
                context.has_flag("-v")
            )?;
            Ok(0)
        }
    }

    fn recording_shell() -> (Arc<Interpreter>, Arc<Mutex<Vec<String>>>) {
        let mut constraint = ArgumentsConstraint::checked(2, 2).unwrap();
        constraint.add_argument("-v", "verbose", 0, 0).unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder {
            constraint,
            calls: Arc::clone(&calls),
        };
        (Arc::new(Interpreter::new(vec![Arc::new(recorder)])), calls)
    }

    fn shell() -> Arc<Interpreter> {
        recording_shell().0
    }

    fn run(sh: &Arc<Interpreter>, line: &str) -> Result<(ExitCode, String)> {
        let mut out = Vec::new();
        let code = sh.execute_line(line, &mut out)?;
        Ok((code, String::from_utf8(out)?))
    }

    #[test]
    fn test_dispatch_uses_command_constraint() {
        let sh = shell();
        let (code, out) = run(&sh, "record x -v").unwrap();
        assert_eq!(code, 0);
        assert_eq!(out, "record x -v [\"record\", \"x\"] true\n");

        let err = run(&sh, "record x y").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ShellError>(),
            Some(&ShellError::TooManyArguments { count: 3, max: 2 })
        );
        let err = run(&sh, "record x -q").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ShellError>(),
            Some(&ShellError::UnknownArgument("-q".to_string()))
        );
    }

    #[test]
    fn test_alias_is_replaced_by_canonical_name() {
        let sh = shell();
        let (_, out) = run(&sh, "rec x").unwrap();
        assert_eq!(out, "record x [\"record\", \"x\"] false\n");
    }

    #[test]
    fn test_blank_lines_do_nothing() {
        let sh = shell();
        assert_eq!(run(&sh, "").unwrap(), (0, String::new()));
        assert_eq!(run(&sh, "   ").unwrap(), (0, String::new()));
        assert_eq!(run(&sh, "%").unwrap(), (0, String::new()));
    }

    #[test]
    fn test_unknown_command() {
        let sh = shell();
        let err = run(&sh, "definitely-not-a-command-1234").unwrap_err();
        assert_eq!(err.to_string(), "command not found: definitely-not-a-command-1234");
        assert_eq!(sh.execute_reporting("definitely-not-a-command-1234", &mut Vec::<u8>::new()), 1);
    }

    #[test]
    fn test_redirection_is_rejected_for_parsed_commands() {
        let sh = shell();
        let err = run(&sh, "record -").unwrap_err();
        assert_eq!(err.downcast_ref::<ShellError>(), Some(&ShellError::RedirectionUnsupported));
    }

    #[test]
    fn test_background_builtin_is_validated_then_run() {
        let (sh, calls) = recording_shell();
        assert!(run(&sh, "record x y %").is_err());

        let (code, out) = run(&sh, "record x %").unwrap();
        assert_eq!(code, 0);
        assert_eq!(out, "[background] record\n");

        sh.wait_background();
        assert_eq!(*calls.lock(), vec!["record x".to_string()]);
    }

    #[test]
    fn test_wait_background_joins_every_command() {
        let (sh, calls) = recording_shell();
        for arg in ["a", "b", "c"] {
            run(&sh, &format!("rec {} %", arg)).unwrap();
        }
        sh.wait_background();

        let mut seen = calls.lock().clone();
        seen.sort();
        assert_eq!(seen, vec!["record a", "record b", "record c"]);
        assert!(sh.background.lock().is_empty());
        sh.wait_background();
    }

    #[test]
    fn test_exit_request() {
        let sh = shell();
        assert_eq!(sh.exit_requested(), None);
        sh.request_exit(3);
        assert_eq!(sh.exit_requested(), Some(3));
    }

    #[test]
    #[cfg(unix)]
    fn test_external_commands() {
        let sh = shell();
        assert_eq!(run(&sh, "/bin/sh -c true").unwrap().0, 0);
        assert_eq!(run(&sh, "/bin/sh -c false").unwrap().0, 1);

        let (code, out) = run(&sh, "/bin/sh -c true %").unwrap();
        assert_eq!(code, 0);
        assert!(out.starts_with('['));
        assert!(out.trim_end().ends_with("/bin/sh -c true"));
        assert_eq!(sh.subprocesses().len(), 1);
    }
}
