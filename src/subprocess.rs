//! Child processes started by the shell and the registry of background ones.

use crate::command::ExitCode;
use crate::env::Environment;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::ffi::OsStr;
use std::fmt;
use std::process::{Child, ExitStatus};
use tracing::{debug, info};

/// Observable state of a subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Suspended,
    Exited(ExitCode),
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Running => write!(f, "running"),
            ProcessState::Suspended => write!(f, "suspended"),
            ProcessState::Exited(code) => write!(f, "exited ({code})"),
        }
    }
}

/// A spawned child process together with its suspend counter.
///
/// Suspensions nest: the process only runs again once every `suspend` has been matched by a
/// `resume`.
pub struct Subprocess {
    child: Child,
    command_line: String,
    suspend_count: u32,
    exit_code: Option<ExitCode>,
}

impl Subprocess {
    /// Start `program` with the shell's variables and working directory.
    ///
    /// A `suspended` process is stopped before the program itself starts and has a suspend
    /// count of 1; it first runs once [`resume`](Self::resume) brings the count back to zero.
    pub fn spawn<S: AsRef<OsStr>>(
        program: impl AsRef<OsStr>,
        args: &[S],
        env: &Environment,
        suspended: bool,
        command_line: impl Into<String>,
    ) -> Result<Self> {
        let program = program.as_ref();
        let mut command = if suspended {
            stopped_launcher(program, args)?
        } else {
            let mut command = std::process::Command::new(program);
            command.args(args);
            command
        };
        let child = command
            .env_clear()
            .envs(env.vars())
            .current_dir(env.current_dir())
            .spawn()
            .with_context(|| format!("failed to start {}", program.to_string_lossy()))?;

        let mut process = Self {
            child,
            command_line: command_line.into(),
            suspend_count: 0,
            exit_code: None,
        };
        info!(pid = process.pid(), command = %process.command_line, "spawned subprocess");

        if suspended {
            process.await_stop()?;
        }
        Ok(process)
    }

    /// Block until a child started by [`stopped_launcher`] has stopped itself.
    #[cfg(unix)]
    fn await_stop(&mut self) -> Result<()> {
        use std::os::unix::process::ExitStatusExt;

        let pid = self.pid() as libc::pid_t;
        let mut status: libc::c_int = 0;
        loop {
            // SAFETY: `status` is a valid out-pointer and `pid` is our own unreaped child.
            let rc = unsafe { libc::waitpid(pid, &mut status, libc::WUNTRACED) };
            if rc != -1 {
                break;
            }
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                return Err(err).with_context(|| format!("failed to wait for process {pid}"));
            }
        }

        if libc::WIFSTOPPED(status) {
            self.suspend_count = 1;
            info!(pid, "subprocess started suspended");
        } else {
            // The launcher died before stopping; its status is already reaped.
            self.exit_code = Some(exit_code(ExitStatus::from_raw(status)));
            debug!(pid, code = ?self.exit_code, "subprocess exited before suspending");
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn await_stop(&mut self) -> Result<()> {
        Ok(())
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Id of the main thread. On Unix this is the process id.
    pub fn tid(&self) -> u32 {
        self.child.id()
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn suspend_count(&self) -> u32 {
        self.suspend_count
    }

    /// Increase the suspend count, stopping the process when it was running.
    ///
    /// Returns the previous count.
    pub fn suspend(&mut self) -> Result<u32> {
        let previous = self.suspend_count;
        if previous == 0 {
            send_signal(self.pid(), Signal::Stop)?;
            info!(pid = self.pid(), "suspended subprocess");
        }
        self.suspend_count += 1;
        Ok(previous)
    }

    /// Decrease the suspend count, continuing the process when it reaches zero.
    ///
    /// Returns the previous count; a running process is left alone.
    pub fn resume(&mut self) -> Result<u32> {
        let previous = self.suspend_count;
        match previous {
            0 => {}
            1 => {
                send_signal(self.pid(), Signal::Continue)?;
                self.suspend_count = 0;
                info!(pid = self.pid(), "resumed subprocess");
            }
            _ => self.suspend_count -= 1,
        }
        Ok(previous)
    }

    /// Poll for termination without blocking.
    pub fn try_status(&mut self) -> Result<Option<ExitCode>> {
        if self.exit_code.is_none() {
            if let Some(status) = self.child.try_wait()? {
                self.exit_code = Some(exit_code(status));
                debug!(pid = self.pid(), code = ?self.exit_code, "subprocess exited");
            }
        }
        Ok(self.exit_code)
    }

    /// Block until the process terminates.
    pub fn wait(&mut self) -> Result<ExitCode> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }
        let code = exit_code(self.child.wait()?);
        self.exit_code = Some(code);
        Ok(code)
    }

    /// Terminate the process and collect its exit code.
    pub fn kill(&mut self) -> Result<ExitCode> {
        if self.try_status()?.is_none() {
            self.child.kill()?;
            info!(pid = self.pid(), "killed subprocess");
        }
        self.wait()
    }

    pub fn state(&mut self) -> Result<ProcessState> {
        Ok(match self.try_status()? {
            Some(code) => ProcessState::Exited(code),
            None if self.suspend_count > 0 => ProcessState::Suspended,
            None => ProcessState::Running,
        })
    }
}

impl fmt::Debug for Subprocess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subprocess")
            .field("pid", &self.pid())
            .field("command_line", &self.command_line)
            .field("suspend_count", &self.suspend_count)
            .finish()
    }
}

/// Point-in-time description of a registered subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprocessInfo {
    pub pid: u32,
    pub tid: u32,
    pub state: ProcessState,
    pub command_line: String,
}

/// Background subprocesses owned by the shell.
///
/// Shared between the prompt and background command threads, so every access goes through
/// the lock.
#[derive(Debug, Default)]
pub struct SubprocessRegistry {
    processes: Mutex<Vec<Subprocess>>,
}

impl SubprocessRegistry {
    pub fn register(&self, process: Subprocess) {
        self.processes.lock().push(process);
    }

    /// Run `f` on the subprocess with the given pid, if there is one.
    pub fn with_pid<R>(&self, pid: u32, f: impl FnOnce(&mut Subprocess) -> R) -> Option<R> {
        let mut processes = self.processes.lock();
        processes.iter_mut().find(|p| p.pid() == pid).map(f)
    }

    pub fn snapshot(&self) -> Result<Vec<SubprocessInfo>> {
        let mut processes = self.processes.lock();
        processes
            .iter_mut()
            .map(|p| {
                Ok(SubprocessInfo {
                    pid: p.pid(),
                    tid: p.tid(),
                    state: p.state()?,
                    command_line: p.command_line().to_string(),
                })
            })
            .collect()
    }

    /// Forget subprocesses that have exited, returning their pids and exit codes.
    pub fn reap(&self) -> Result<Vec<(u32, ExitCode)>> {
        let mut processes = self.processes.lock();
        let mut finished = Vec::new();
        let mut index = 0;
        while index < processes.len() {
            match processes[index].try_status()? {
                Some(code) => {
                    let process = processes.remove(index);
                    finished.push((process.pid(), code));
                }
                None => index += 1,
            }
        }
        Ok(finished)
    }

    pub fn len(&self) -> usize {
        self.processes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Script run by `/bin/sh` for suspended starts: stop, then become the real program once
/// continued. The pid is kept across the `exec`.
#[cfg(unix)]
const STOP_THEN_EXEC: &str = r#"kill -STOP $$; exec "$0" "$@""#;

/// A command that runs `program` only after it has been continued.
///
/// `Command::spawn` returns once the child has called `exec`, so a child that stops inside
/// `pre_exec` would block it forever. Stopping in a shell that then `exec`s keeps the target
/// from running any of its own code before `resume`.
#[cfg(unix)]
fn stopped_launcher<S: AsRef<OsStr>>(program: &OsStr, args: &[S]) -> Result<std::process::Command> {
    let mut command = std::process::Command::new("/bin/sh");
    command.arg("-c").arg(STOP_THEN_EXEC).arg(program).args(args);
    Ok(command)
}

#[cfg(not(unix))]
fn stopped_launcher<S: AsRef<OsStr>>(program: &OsStr, _args: &[S]) -> Result<std::process::Command> {
    anyhow::bail!(
        "starting {} suspended is not supported on this platform",
        program.to_string_lossy()
    )
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Stop,
    Continue,
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    let signo = match signal {
        Signal::Stop => libc::SIGSTOP,
        Signal::Continue => libc::SIGCONT,
    };
    // SAFETY: kill has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid as libc::pid_t, signo) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("failed to signal process {pid}"));
    }
    Ok(())
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _signal: Signal) -> Result<()> {
    anyhow::bail!("suspending process {pid} is not supported on this platform")
}

/// Convert an exit status into a shell exit code.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = exit_status.signal() {
        128 + signal
    } else if exit_status.core_dumped() {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_until_exited(process: &mut Subprocess) -> Option<ExitCode> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(code) = process.try_status().unwrap() {
                return Some(code);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        None
    }

    #[test]
    fn test_spawn_and_wait_reports_exit_code() {
        let env = Environment::from_process();
        let mut ok = Subprocess::spawn("/bin/sh", &["-c", "exit 0"], &env, false, "sh").unwrap();
        assert_eq!(ok.wait().unwrap(), 0);

        let mut fail = Subprocess::spawn("/bin/sh", &["-c", "exit 3"], &env, false, "sh").unwrap();
        assert_eq!(fail.wait().unwrap(), 3);
        assert_eq!(fail.state().unwrap(), ProcessState::Exited(3));
    }

    #[test]
    fn test_suspend_counter_nests() {
        let env = Environment::from_process();
        let mut process =
            Subprocess::spawn("/bin/sh", &["-c", "sleep 30"], &env, false, "sleep").unwrap();
        assert_eq!(process.state().unwrap(), ProcessState::Running);

        assert_eq!(process.suspend().unwrap(), 0);
        assert_eq!(process.suspend().unwrap(), 1);
        assert_eq!(process.state().unwrap(), ProcessState::Suspended);

        assert_eq!(process.resume().unwrap(), 2);
        assert_eq!(process.state().unwrap(), ProcessState::Suspended);
        assert_eq!(process.resume().unwrap(), 1);
        assert_eq!(process.state().unwrap(), ProcessState::Running);
        assert_eq!(process.resume().unwrap(), 0);
        assert_eq!(process.suspend_count(), 0);

        assert_eq!(process.kill().unwrap(), 128 + libc::SIGKILL);
    }

    #[test]
    fn test_suspended_process_runs_after_resume() {
        let env = Environment::from_process();
        let mut process =
            Subprocess::spawn("/bin/sh", &["-c", "exit 7"], &env, true, "sh").unwrap();
        assert_eq!(process.suspend_count(), 1);

        process.resume().unwrap();
        assert_eq!(wait_until_exited(&mut process), Some(7));
    }

    #[test]
    fn test_suspended_process_does_nothing_before_resume() {
        let env = Environment::from_process();
        let dir = std::env::temp_dir().join(format!("liteshell_suspended_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for round in 0..20 {
            let marker = dir.join(format!("marker_{round}"));
            let script = format!(": > '{}'", marker.display());
            let mut process =
                Subprocess::spawn("/bin/sh", &["-c", script.as_str()], &env, true, "touch").unwrap();
            assert_eq!(process.state().unwrap(), ProcessState::Suspended);

            std::thread::sleep(Duration::from_millis(20));
            assert!(!marker.exists(), "round {round}: ran while suspended");

            process.resume().unwrap();
            assert_eq!(wait_until_exited(&mut process), Some(0));
            assert!(marker.exists());
        }

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_registry_lookup_and_reap() {
        let env = Environment::from_process();
        let registry = SubprocessRegistry::default();

        let quick = Subprocess::spawn("/bin/sh", &["-c", "exit 0"], &env, false, "quick").unwrap();
        let quick_pid = quick.pid();
        let slow = Subprocess::spawn("/bin/sh", &["-c", "sleep 30"], &env, false, "slow").unwrap();
        let slow_pid = slow.pid();
        registry.register(quick);
        registry.register(slow);
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.with_pid(slow_pid, |p| p.tid()), Some(slow_pid));
        assert_eq!(registry.with_pid(0, |p| p.tid()), None);

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut reaped = Vec::new();
        while reaped.is_empty() && Instant::now() < deadline {
            reaped = registry.reap().unwrap();
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(reaped, vec![(quick_pid, 0)]);

        let snapshot = registry.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].command_line, "slow");
        assert_eq!(snapshot[0].state, ProcessState::Running);

        let killed = registry.with_pid(slow_pid, |p| p.kill().unwrap());
        assert_eq!(killed, Some(128 + libc::SIGKILL));
    }
}
