//! External process execution.
//!
//! Every component that shells out goes through [`ProcessRunner`], so the
//! command lines they build can be asserted on without running real tools.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// Runs and locates external programs.
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` to completion, blocking the caller, and captures its output.
    ///
    /// # Errors
    ///
    /// Returns the spawn error; `NotFound` means the binary does not exist.
    fn run(&self, program: &Path, args: &[String]) -> io::Result<CommandOutput>;

    /// Starts `program` detached from this process and returns its PID.
    ///
    /// The child gets its own session (unix) or process group (Windows) and
    /// null stdio, so it outlives the caller.
    ///
    /// # Errors
    ///
    /// Returns the spawn error.
    fn spawn_detached(&self, program: &Path, args: &[String]) -> io::Result<u32>;

    /// Whether `path` is an existing regular file.
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Searches the `PATH` environment variable for `name`.
    fn find_in_path(&self, name: &str) -> Option<PathBuf> {
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(name))
            .find(|candidate| self.is_file(candidate))
    }
}

/// [`ProcessRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<CommandOutput> {
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(CommandOutput {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }

    fn spawn_detached(&self, program: &Path, args: &[String]) -> io::Result<u32> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut cmd);
        let child = cmd.spawn()?;
        Ok(child.id())
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    // New session: no controlling terminal, survives the parent's exit.
    #[allow(unsafe_code)]
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}
