use crate::command::{Command, ExitCode};
use crate::constraint::ArgumentsConstraint;
use crate::context::Context;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::table::{Table, console_width};
use anyhow::{Context as _, Result, anyhow, bail};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Every builtin command, in the order `help` lists them.
pub fn all() -> Result<Vec<Arc<dyn Command>>, ShellError> {
    Ok(vec![
        Arc::new(Cat::new()?),
        Arc::new(Cd::new()?),
        Arc::new(Echo::new()),
        Arc::new(Env::new()),
        Arc::new(Exit::new()?),
        Arc::new(Help::new()?),
        Arc::new(Jobs::new()?),
        Arc::new(Pwd::new()?),
        Arc::new(Resume::new()?),
        Arc::new(Start::new()?),
        Arc::new(Suspend::new()?),
        Arc::new(Tree::new()?),
    ])
}

/// Parse the process id given as the single argument of `resume`/`suspend`.
fn pid_argument(context: &Context<'_>) -> Result<u32> {
    let raw = &context.positional_args()[1];
    raw.parse()
        .with_context(|| format!("invalid process ID: {}", raw))
}

/// Print the contents of files.
pub struct Cat {
    constraint: ArgumentsConstraint,
}

impl Cat {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(2, usize::MAX)?,
        })
    }
}

impl Command for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn description(&self) -> &str {
        "Read a file"
    }

    fn long_description(&self) -> &str {
        "Displays the contents of one or more text files, in order."
    }

    fn usage(&self) -> &str {
        "cat <file>..."
    }

    fn aliases(&self) -> &[&str] {
        &["type"]
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let env = context.interpreter().environment().read().clone();
        for name in &context.positional_args()[1..] {
            let mut file = fs::File::open(env.resolve(name))
                .with_context(|| format!("cat: {}", name))?;
            std::io::copy(&mut file, stdout).with_context(|| format!("cat: {}", name))?;
        }
        Ok(0)
    }
}

/// Change the shell's working directory.
pub struct Cd {
    constraint: ArgumentsConstraint,
}

impl Cd {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(1, 2)?,
        })
    }
}

impl Command for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn description(&self) -> &str {
        "Change the current working directory"
    }

    fn long_description(&self) -> &str {
        "Without a target, changes to the directory named by the HOME variable."
    }

    fn usage(&self) -> &str {
        "cd [directory]"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, _stdout: &mut dyn Write) -> Result<ExitCode> {
        let mut env = context.interpreter().environment().write();
        let target = match context.positional_args().get(1) {
            Some(t) => PathBuf::from(t),
            None => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => bail!("cd: no target and HOME not set"),
            },
        };

        let new_dir = env.resolve(&target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;
        if !canonical.is_dir() {
            bail!("cd: not a directory: {}", canonical.display());
        }
        env.set_current_dir(canonical);
        Ok(0)
    }
}

/// Print the rest of the line as typed.
pub struct Echo {
    constraint: ArgumentsConstraint,
}

impl Echo {
    pub fn new() -> Self {
        Self {
            constraint: ArgumentsConstraint::no_parsing(),
        }
    }
}

impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Print a line of text"
    }

    fn usage(&self) -> &str {
        "echo <text>"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let line = context.message().trim_start();
        let text = line
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or("");
        writeln!(stdout, "{}", text)?;
        Ok(0)
    }
}

/// Show all environment variables.
pub struct Env {
    constraint: ArgumentsConstraint,
}

impl Env {
    pub fn new() -> Self {
        Self {
            constraint: ArgumentsConstraint::no_parsing(),
        }
    }
}

impl Command for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn description(&self) -> &str {
        "Display all environment variables"
    }

    fn usage(&self) -> &str {
        "env"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let mut table = Table::new(["Name", "Value"]);
        if let Some(columns) = console_width() {
            table.limit(0, 30).limit(1, columns.saturating_sub(35));
        }

        let env = context.interpreter().environment().read();
        for (name, value) in env.vars() {
            table.add_row([name, value]);
        }
        write!(stdout, "{}", table.render())?;
        Ok(0)
    }
}

/// Leave the interactive loop.
pub struct Exit {
    constraint: ArgumentsConstraint,
}

impl Exit {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(1, 2)?,
        })
    }
}

impl Command for Exit {
    fn name(&self) -> &str {
        "exit"
    }

    fn description(&self) -> &str {
        "Exit the shell"
    }

    fn usage(&self) -> &str {
        "exit [code]"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, _stdout: &mut dyn Write) -> Result<ExitCode> {
        let code: ExitCode = match context.positional_args().get(1) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("exit: invalid exit code: {}", raw))?,
            None => 0,
        };
        context.interpreter().request_exit(code);
        Ok(code)
    }
}

/// List commands or describe one of them.
pub struct Help {
    constraint: ArgumentsConstraint,
}

impl Help {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(1, 2)?,
        })
    }

    fn describe(command: &dyn Command, stdout: &mut dyn Write) -> Result<()> {
        writeln!(stdout, "{}", command.description())?;
        writeln!(stdout, "Usage: {}", command.usage())?;
        if !command.long_description().is_empty() {
            writeln!(stdout)?;
            writeln!(stdout, "{}", command.long_description())?;
        }
        if !command.aliases().is_empty() {
            writeln!(stdout, "Aliases: {}", command.aliases().join(", "))?;
        }

        let constraint = command.constraint();
        if constraint.alias_groups().is_empty() {
            return Ok(());
        }
        writeln!(stdout, "Options:")?;
        for group in constraint.alias_groups() {
            // Short spellings first: "-s, --suspended".
            let mut names: Vec<&str> = group.iter().map(String::as_str).collect();
            names.sort_by_key(|name| (name.starts_with("--"), *name));
            let first = names[0];
            let mut line = format!("  {:<24} {}", names.join(", "), constraint.help(first)?);
            match constraint.bounds(first)? {
                (0, 0) => {}
                (min, max) if min == max => line.push_str(&format!(" (takes {} value(s))", min)),
                (min, max) => line.push_str(&format!(" (takes {} to {} values)", min, max)),
            }
            writeln!(stdout, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

impl Command for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Get help about commands"
    }

    fn usage(&self) -> &str {
        "help [command]"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let interpreter = context.interpreter();
        match context.positional_args().get(1) {
            Some(name) => {
                let command = interpreter
                    .find_command(name)
                    .ok_or_else(|| anyhow!("help: no such command: {}", name))?;
                Self::describe(&**command, stdout)?;
            }
            None => {
                let mut commands: Vec<&Arc<dyn Command>> = interpreter.commands().iter().collect();
                commands.sort_by(|a, b| a.name().cmp(b.name()));
                for command in commands {
                    writeln!(stdout, "{:<10} {}", command.name(), command.description())?;
                }
            }
        }
        Ok(0)
    }
}

/// List background subprocesses.
pub struct Jobs {
    constraint: ArgumentsConstraint,
}

impl Jobs {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(1, 1)?,
        })
    }
}

impl Command for Jobs {
    fn name(&self) -> &str {
        "jobs"
    }

    fn description(&self) -> &str {
        "List background subprocesses"
    }

    fn long_description(&self) -> &str {
        "Finished subprocesses are reported once and then forgotten."
    }

    fn usage(&self) -> &str {
        "jobs"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let registry = context.interpreter().subprocesses();
        for (pid, code) in registry.reap()? {
            writeln!(stdout, "[{}] exited with status {}", pid, code)?;
        }

        let running = registry.snapshot()?;
        if running.is_empty() {
            writeln!(stdout, "No background subprocesses")?;
            return Ok(0);
        }

        let mut table = Table::new(["PID", "TID", "State", "Command"]);
        for info in running {
            table.add_row([
                info.pid.to_string(),
                info.tid.to_string(),
                info.state.to_string(),
                info.command_line,
            ]);
        }
        write!(stdout, "{}", table.render())?;
        Ok(0)
    }
}

/// Print the working directory.
pub struct Pwd {
    constraint: ArgumentsConstraint,
}

impl Pwd {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(1, 1)?,
        })
    }
}

impl Command for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn description(&self) -> &str {
        "Print the current working directory"
    }

    fn usage(&self) -> &str {
        "pwd"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let env = context.interpreter().environment().read();
        writeln!(stdout, "{}", env.current_dir().display())?;
        Ok(0)
    }
}

/// Undo one `suspend` of a background subprocess.
pub struct Resume {
    constraint: ArgumentsConstraint,
}

impl Resume {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(2, 2)?,
        })
    }
}

impl Command for Resume {
    fn name(&self) -> &str {
        "resume"
    }

    fn description(&self) -> &str {
        "Decrease the suspend count of a subprocess with the given PID"
    }

    fn long_description(&self) -> &str {
        "The subprocess continues once its suspend count reaches zero."
    }

    fn usage(&self) -> &str {
        "resume <pid>"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let pid = pid_argument(context)?;
        let tid = context
            .interpreter()
            .subprocesses()
            .with_pid(pid, |process| process.resume().map(|_| process.tid()))
            .ok_or_else(|| anyhow!("Cannot find a subprocess with the given PID"))??;
        writeln!(stdout, "Resumed process ID {}, thread ID {}", pid, tid)?;
        Ok(0)
    }
}

/// Start a program in the background, optionally suspended.
pub struct Start {
    constraint: ArgumentsConstraint,
}

impl Start {
    pub fn new() -> Result<Self, ShellError> {
        let mut constraint = ArgumentsConstraint::checked(2, usize::MAX)?;
        constraint.add_argument_aliases(
            &["-s", "--suspended"],
            "create the subprocess in a suspended state",
            0,
            0,
        )?;
        Ok(Self { constraint })
    }
}

impl Command for Start {
    fn name(&self) -> &str {
        "start"
    }

    fn description(&self) -> &str {
        "Start a program as a background subprocess"
    }

    fn long_description(&self) -> &str {
        "Options must follow the program arguments. A suspended subprocess runs after `resume`."
    }

    fn usage(&self) -> &str {
        "start <program> [args...] [-s]"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let interpreter = context.interpreter();
        let suspended = context.has_flag("-s") || context.has_flag("--suspended");
        let program = &context.positional_args()[1];
        let args = &context.positional_args()[2..];
        let command_line = context.positional_args()[1..].join(" ");

        let env = interpreter.environment().read().clone();
        let external = ExternalCommand::find(&env, program, args, &command_line)
            .ok_or_else(|| anyhow!("start: command not found: {}", program))?;
        let pid = external.run_background(&env, interpreter.subprocesses(), suspended)?;

        if suspended {
            writeln!(stdout, "[{}] {} (suspended)", pid, command_line)?;
        } else {
            writeln!(stdout, "[{}] {}", pid, command_line)?;
        }
        Ok(0)
    }
}

/// Stop a background subprocess until it is resumed.
pub struct Suspend {
    constraint: ArgumentsConstraint,
}

impl Suspend {
    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(2, 2)?,
        })
    }
}

impl Command for Suspend {
    fn name(&self) -> &str {
        "suspend"
    }

    fn description(&self) -> &str {
        "Increase the suspend count of a subprocess with the given PID"
    }

    fn usage(&self) -> &str {
        "suspend <pid>"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let pid = pid_argument(context)?;
        let tid = context
            .interpreter()
            .subprocesses()
            .with_pid(pid, |process| process.suspend().map(|_| process.tid()))
            .ok_or_else(|| anyhow!("Cannot find a subprocess with the given PID"))??;
        writeln!(stdout, "Suspended process ID {}, thread ID {}", pid, tid)?;
        Ok(0)
    }
}

/// Show a directory and everything below it.
pub struct Tree {
    constraint: ArgumentsConstraint,
}

impl Tree {
    const MAX_DEPTH: usize = 64;

    pub fn new() -> Result<Self, ShellError> {
        Ok(Self {
            constraint: ArgumentsConstraint::checked(1, 2)?,
        })
    }

    fn walk(dir: &Path, prefix: &str, depth: usize, stdout: &mut dyn Write) -> Result<()> {
        if depth >= Self::MAX_DEPTH {
            bail!("tree: too many levels of nesting at {}", dir.display());
        }

        let mut entries = fs::read_dir(dir)
            .with_context(|| format!("tree: can't read {}", dir.display()))?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let count = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            let last = index + 1 == count;
            let name = entry.file_name().to_string_lossy().into_owned();
            writeln!(stdout, "{}{}{}", prefix, if last { "└── " } else { "├── " }, name)?;

            // file_type does not follow symlinks.
            if entry.file_type()?.is_dir() && !name.starts_with('.') {
                let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                Self::walk(&entry.path(), &child_prefix, depth + 1, stdout)?;
            }
        }
        Ok(())
    }
}

impl Command for Tree {
    fn name(&self) -> &str {
        "tree"
    }

    fn description(&self) -> &str {
        "Show the directory tree"
    }

    fn long_description(&self) -> &str {
        "Hidden directories and symbolic links are listed but not entered."
    }

    fn usage(&self) -> &str {
        "tree [directory]"
    }

    fn constraint(&self) -> &ArgumentsConstraint {
        &self.constraint
    }

    fn run(&self, context: &Context<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        let root = {
            let env = context.interpreter().environment().read();
            match context.positional_args().get(1) {
                Some(dir) => env.resolve(dir),
                None => env.current_dir().to_path_buf(),
            }
        };
        writeln!(stdout, "Content of {}:", root.display())?;
        Self::walk(&root, "", 0, stdout)?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use std::io;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn shell() -> Arc<Interpreter> {
        Arc::new(Interpreter::with_builtins().unwrap())
    }

    fn run(sh: &Arc<Interpreter>, line: &str) -> Result<(ExitCode, String)> {
        let mut out = Vec::new();
        let code = sh.execute_line(line, &mut out)?;
        Ok((code, String::from_utf8(out)?))
    }

    fn make_unique_temp_dir(tag: &str) -> io::Result<PathBuf> {
        let mut p = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("liteshell_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        fs::canonicalize(&p)
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let commands = all().unwrap();
        let mut names: Vec<&str> = commands
            .iter()
            .flat_map(|c| std::iter::once(c.name()).chain(c.aliases().iter().copied()))
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_echo_prints_rest_of_line() {
        let sh = shell();
        assert_eq!(run(&sh, "echo hello world").unwrap().1, "hello world\n");
        assert_eq!(run(&sh, "  echo   -A - --x  ").unwrap().1, "-A - --x\n");
        assert_eq!(run(&sh, "echo").unwrap().1, "\n");
    }

    #[test]
    fn test_cat_reads_files_and_alias() {
        let dir = make_unique_temp_dir("cat").unwrap();
        fs::write(dir.join("a.txt"), "hello\n").unwrap();
        fs::write(dir.join("b.txt"), "world\n").unwrap();

        let sh = shell();
        sh.environment().write().set_current_dir(dir.clone());

        assert_eq!(run(&sh, "cat a.txt b.txt").unwrap(), (0, "hello\nworld\n".to_string()));
        assert_eq!(run(&sh, "type a.txt").unwrap().1, "hello\n");

        let missing = run(&sh, "cat").unwrap_err();
        assert_eq!(
            missing.downcast_ref::<ShellError>(),
            Some(&ShellError::TooFewArguments { count: 1, min: 2 })
        );
        assert!(run(&sh, "cat nope.txt").is_err());
        assert!(run(&sh, "cat a.txt -n").is_err());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_cd_and_pwd() {
        let dir = make_unique_temp_dir("cd").unwrap();
        fs::create_dir(dir.join("sub")).unwrap();
        fs::write(dir.join("file"), "").unwrap();

        let sh = shell();
        run(&sh, &format!("cd {}", dir.display())).unwrap();
        assert_eq!(run(&sh, "pwd").unwrap().1, format!("{}\n", dir.display()));

        run(&sh, "cd sub").unwrap();
        assert_eq!(sh.environment().read().current_dir(), dir.join("sub"));
        run(&sh, "cd ..").unwrap();
        assert_eq!(sh.environment().read().current_dir(), dir);

        assert!(run(&sh, "cd file").is_err());
        assert!(run(&sh, "cd missing").is_err());
        assert_eq!(sh.environment().read().current_dir(), dir);

        sh.environment().write().set_var("HOME", dir.join("sub").to_string_lossy());
        run(&sh, "cd").unwrap();
        assert_eq!(sh.environment().read().current_dir(), dir.join("sub"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_env_lists_variables() {
        let sh = shell();
        sh.environment().write().set_var("LITESHELL_TEST_VAR", "some value");

        let (code, out) = run(&sh, "env").unwrap();
        assert_eq!(code, 0);
        assert!(out.starts_with("Name"));
        assert!(
            out.lines()
                .any(|l| l.starts_with("LITESHELL_TEST_VAR") && l.ends_with("| some value"))
        );
    }

    #[test]
    fn test_exit_requests_shutdown() {
        let sh = shell();
        assert_eq!(run(&sh, "exit 4").unwrap().0, 4);
        assert_eq!(sh.exit_requested(), Some(4));

        let sh = shell();
        assert_eq!(run(&sh, "exit").unwrap().0, 0);
        assert_eq!(sh.exit_requested(), Some(0));

        let sh = shell();
        assert!(run(&sh, "exit soon").is_err());
        assert_eq!(sh.exit_requested(), None);
    }

    #[test]
    fn test_help_lists_and_describes() {
        let sh = shell();
        let (_, out) = run(&sh, "help").unwrap();
        assert!(out.lines().any(|l| l.starts_with("cat") && l.ends_with("Read a file")));
        assert_eq!(out.lines().count(), sh.commands().len());

        let (_, out) = run(&sh, "help start").unwrap();
        assert!(out.contains("Usage: start <program> [args...] [-s]"));
        assert!(out.contains("-s, --suspended"));
        assert!(out.contains("create the subprocess in a suspended state"));

        let (_, out) = run(&sh, "help type").unwrap();
        assert!(out.contains("Aliases: type"));

        assert!(run(&sh, "help nothing").is_err());
    }

    #[test]
    fn test_resume_unknown_pid() {
        let sh = shell();
        let err = run(&sh, "resume 999999").unwrap_err();
        assert_eq!(err.to_string(), "Cannot find a subprocess with the given PID");
        assert!(run(&sh, "suspend abc").is_err());
        assert!(run(&sh, "resume").is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_start_suspend_resume_jobs() {
        let sh = shell();
        assert_eq!(run(&sh, "jobs").unwrap().1, "No background subprocesses\n");

        let (_, out) = run(&sh, "start sleep 30 -s").unwrap();
        assert!(out.ends_with("sleep 30 (suspended)\n"), "{}", out);
        let pid: u32 = out[1..out.find(']').unwrap()].parse().unwrap();

        let (_, jobs) = run(&sh, "jobs").unwrap();
        assert!(jobs.lines().any(|l| l.starts_with(&pid.to_string()) && l.contains("suspended")));

        let (_, out) = run(&sh, &format!("resume {}", pid)).unwrap();
        assert_eq!(out, format!("Resumed process ID {}, thread ID {}\n", pid, pid));
        let (_, jobs) = run(&sh, "jobs").unwrap();
        assert!(jobs.contains("running"));

        let (_, out) = run(&sh, &format!("suspend {}", pid)).unwrap();
        assert_eq!(out, format!("Suspended process ID {}, thread ID {}\n", pid, pid));

        sh.subprocesses().with_pid(pid, |p| p.kill().unwrap());
        let (_, jobs) = run(&sh, "jobs").unwrap();
        assert!(jobs.starts_with(&format!("[{}] exited with status", pid)));
        assert!(sh.subprocesses().is_empty());
    }

    #[test]
    fn test_start_unknown_program() {
        let sh = shell();
        assert!(run(&sh, "start definitely-not-a-program-1234").is_err());
        assert!(sh.subprocesses().is_empty());
    }

    #[test]
    fn test_tree_draws_sorted_entries() {
        let dir = make_unique_temp_dir("tree").unwrap();
        fs::create_dir_all(dir.join("a")).unwrap();
        fs::write(dir.join("a").join("x.txt"), "").unwrap();
        fs::write(dir.join("b.txt"), "").unwrap();
        fs::create_dir_all(dir.join(".hidden")).unwrap();
        fs::write(dir.join(".hidden").join("y"), "").unwrap();

        let sh = shell();
        let (code, out) = run(&sh, &format!("tree {}", dir.display())).unwrap();
        assert_eq!(code, 0);
        assert_eq!(
            out,
            format!(
                "Content of {}:\n\
                 ├── .hidden\n\
                 ├── a\n\
                 │   └── x.txt\n\
                 └── b.txt\n",
                dir.display()
            )
        );

        assert!(run(&sh, "tree a b").is_err());
        let _ = fs::remove_dir_all(dir);
    }
}
