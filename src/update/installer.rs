//! Executable replacement through a detached handoff script.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::handoff::{self, HandoffPlan};
use crate::constants;
use crate::error::{Error, Result};
use crate::logger::{self, LogLevel};
use crate::platform::Platform;
use crate::process::ProcessRunner;
use crate::state::InstallerState;
use crate::utils;

/// Result of a successful [`SelfUpdateInstaller::install`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Running from a source build; nothing was touched.
    SkippedSourceBuild,
    /// The handoff script is running; the caller must now exit.
    HandoffLaunched { script: PathBuf, handoff_pid: u32 },
}

/// Swaps the running executable for a downloaded one.
pub struct SelfUpdateInstaller {
    runner: Arc<dyn ProcessRunner>,
    platform: Platform,
    current_exe: PathBuf,
    pid: u32,
    state: InstallerState,
}

impl SelfUpdateInstaller {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        platform: Platform,
        current_exe: PathBuf,
        pid: u32,
    ) -> Self {
        Self {
            runner,
            platform,
            current_exe,
            pid,
            state: InstallerState::Idle,
        }
    }

    pub fn state(&self) -> &InstallerState {
        &self.state
    }

    pub fn current_exe(&self) -> &Path {
        &self.current_exe
    }

    /// Whether this executable may replace itself.
    pub fn is_packaged(&self) -> bool {
        !utils::is_source_build(&self.current_exe)
    }

    /// Where the handoff script is written: beside the executable.
    pub fn script_path(&self) -> PathBuf {
        self.current_exe
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(handoff::script_name(self.platform))
    }

    /// Writes the handoff script and starts it detached.
    ///
    /// On success the caller is expected to call [`Self::terminate`] right
    /// away. On failure nothing has been replaced and the process keeps
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if an install already started or the
    /// download is missing, and [`Error::Io`] if the script cannot be
    /// written or launched.
    pub fn install(&mut self, downloaded: &Path) -> Result<InstallOutcome> {
        if !self.is_packaged() {
            logger::log(LogLevel::Info, "UPDATE", constants::MSG_SOURCE_BUILD);
            return Ok(InstallOutcome::SkippedSourceBuild);
        }
        if self.state != InstallerState::Idle {
            return Err(Error::Validation("Update installation already started.".to_string()));
        }
        if !downloaded.is_file() {
            return Err(Error::Validation(format!(
                "Downloaded update not found: {}",
                downloaded.display()
            )));
        }

        let script = self.script_path();
        let body = HandoffPlan::replace_executable(&self.current_exe, downloaded, self.pid)
            .render(self.platform);
        write_script(&script, &body)?;
        self.state = InstallerState::ScriptWritten(script.clone());
        logger::log(
            LogLevel::Info,
            "UPDATE",
            format!("Handoff script written to {}", script.display()),
        );

        let (shell, args) = self.launch_command(&script);
        match self.runner.spawn_detached(&shell, &args) {
            Ok(handoff_pid) => {
                self.state = InstallerState::HandoffLaunched;
                logger::log(
                    LogLevel::Success,
                    "UPDATE",
                    format!("Handoff started (pid {handoff_pid}); restarting."),
                );
                Ok(InstallOutcome::HandoffLaunched { script, handoff_pid })
            }
            Err(e) => {
                let _ = fs::remove_file(&script);
                self.state = InstallerState::Idle;
                logger::log(
                    LogLevel::Error,
                    "UPDATE",
                    format!("Failed to launch handoff script: {e}"),
                );
                Err(Error::io_at("launch", &script, e))
            }
        }
    }

    fn launch_command(&self, script: &Path) -> (PathBuf, Vec<String>) {
        let script = script.to_string_lossy().to_string();
        match self.platform {
            Platform::Windows => (PathBuf::from("cmd"), vec!["/C".to_string(), script]),
            Platform::Linux => (PathBuf::from("/bin/sh"), vec![script]),
        }
    }

    /// Exits the process so the handoff script can replace the executable.
    pub fn terminate(mut self) -> ! {
        self.state = InstallerState::ProcessExiting;
        logger::log(LogLevel::Info, "UPDATE", "Exiting for update.");
        std::process::exit(0)
    }
}

fn write_script(path: &Path, body: &str) -> Result<()> {
    fs::write(path, body).map_err(|e| Error::io_at("write", path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::io_at("chmod", path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;

    struct Fixture {
        _dir: tempfile::TempDir,
        exe: PathBuf,
        downloaded: PathBuf,
    }

    fn fixture(sub: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let bin_dir = dir.path().join(sub);
        fs::create_dir_all(&bin_dir).unwrap();
        let exe = bin_dir.join("hostdeck");
        let downloaded = bin_dir.join("tool-UniversalVPNTool.new");
        fs::write(&exe, b"old").unwrap();
        fs::write(&downloaded, b"new").unwrap();
        Fixture {
            _dir: dir,
            exe,
            downloaded,
        }
    }

    #[test]
    fn test_install_writes_and_launches_script() {
        let fx = fixture("bin");
        let runner = Arc::new(FakeRunner::default());
        let mut installer =
            SelfUpdateInstaller::new(runner.clone(), Platform::Linux, fx.exe.clone(), 777);

        let outcome = installer.install(&fx.downloaded).unwrap();
        let script = fx.exe.parent().unwrap().join("update.sh");
        assert_eq!(
            outcome,
            InstallOutcome::HandoffLaunched {
                script: script.clone(),
                handoff_pid: 4242
            }
        );
        assert_eq!(installer.state(), &InstallerState::HandoffLaunched);

        let body = fs::read_to_string(&script).unwrap();
        assert!(body.starts_with("#!/bin/sh\n"));
        assert!(body.contains("kill -9 777"));
        let swap = format!("mv -f '{}' '{}'", fx.downloaded.display(), fx.exe.display());
        assert!(body.contains(&swap));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].detached);
        assert_eq!(calls[0].program, PathBuf::from("/bin/sh"));
        assert_eq!(calls[0].args, vec![script.to_string_lossy().to_string()]);
        // Nothing is swapped until the script runs.
        assert_eq!(fs::read(&fx.exe).unwrap(), b"old");
    }

    #[cfg(unix)]
    #[test]
    fn test_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let fx = fixture("bin");
        let mut installer =
            SelfUpdateInstaller::new(
                Arc::new(FakeRunner::default()),
                Platform::Linux,
                fx.exe.clone(),
                1,
            );
        installer.install(&fx.downloaded).unwrap();
        let mode = fs::metadata(installer.script_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_windows_launch_goes_through_cmd() {
        let fx = fixture("bin");
        let runner = Arc::new(FakeRunner::default());
        let mut installer =
            SelfUpdateInstaller::new(runner.clone(), Platform::Windows, fx.exe.clone(), 9);
        installer.install(&fx.downloaded).unwrap();

        let script = fx.exe.parent().unwrap().join("update.bat");
        assert!(fs::read_to_string(&script).unwrap().starts_with("@echo off\r\n"));
        let calls = runner.calls();
        assert_eq!(calls[0].program, PathBuf::from("cmd"));
        assert_eq!(calls[0].args[0], "/C");
    }

    #[test]
    fn test_launch_failure_keeps_running_state() {
        let fx = fixture("bin");
        let runner = Arc::new(
            FakeRunner::default()
                .respond(Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied))),
        );
        let mut installer = SelfUpdateInstaller::new(runner, Platform::Linux, fx.exe.clone(), 1);

        let err = installer.install(&fx.downloaded).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(installer.state(), &InstallerState::Idle);
        assert!(!installer.script_path().exists());
    }

    #[test]
    fn test_source_build_is_a_no_op() {
        let fx = fixture("target/release");
        let runner = Arc::new(FakeRunner::default());
        let mut installer =
            SelfUpdateInstaller::new(runner.clone(), Platform::Linux, fx.exe.clone(), 1);

        assert!(!installer.is_packaged());
        assert_eq!(installer.install(&fx.downloaded).unwrap(), InstallOutcome::SkippedSourceBuild);
        assert!(runner.calls().is_empty());
        assert!(!installer.script_path().exists());
        assert_eq!(installer.state(), &InstallerState::Idle);
    }

    #[test]
    fn test_missing_download_is_rejected() {
        let fx = fixture("bin");
        let runner = Arc::new(FakeRunner::default());
        let mut installer =
            SelfUpdateInstaller::new(runner.clone(), Platform::Linux, fx.exe.clone(), 1);
        let err = installer.install(&fx.exe.with_file_name("missing.new")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_unwritable_script_location() {
        let dir = tempfile::tempdir().unwrap();
        let downloaded = dir.path().join("x.new");
        fs::write(&downloaded, b"new").unwrap();
        let exe = dir.path().join("gone").join("hostdeck");

        let runner = Arc::new(FakeRunner::default());
        let mut installer = SelfUpdateInstaller::new(runner.clone(), Platform::Linux, exe, 1);
        assert!(matches!(installer.install(&downloaded), Err(Error::Io { .. })));
        assert_eq!(installer.state(), &InstallerState::Idle);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_second_install_refused() {
        let fx = fixture("bin");
        let mut installer =
            SelfUpdateInstaller::new(
                Arc::new(FakeRunner::default()),
                Platform::Linux,
                fx.exe.clone(),
                1,
            );
        installer.install(&fx.downloaded).unwrap();
        assert!(matches!(installer.install(&fx.downloaded), Err(Error::Validation(_))));
    }
}
