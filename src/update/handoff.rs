//! Handoff script generation.
//!
//! A running executable cannot overwrite itself, so the swap is delegated to
//! a short script that outlives this process. The script is described as a
//! list of [`HandoffStep`]s and rendered through a per-platform table of
//! command templates, which keeps the generated text testable without
//! running it.

use std::path::{Path, PathBuf};

use crate::constants;
use crate::platform::Platform;

/// One action of the handoff procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffStep {
    /// Give the parent a moment to exit on its own.
    Sleep { secs: u64 },
    /// Force-terminate the parent if it is still around.
    Terminate { pid: u32 },
    /// Move a file, replacing the destination.
    Move { from: PathBuf, to: PathBuf },
    /// Set the executable bit (no-op on Windows).
    MakeExecutable { path: PathBuf },
    /// Start a program detached from the script.
    Launch { path: PathBuf },
    Remove { path: PathBuf },
    /// Delete the script file itself.
    RemoveSelf,
}

/// Command templates for one shell dialect.
///
/// Placeholders: `{secs}`, `{pings}` (`secs + 1`), `{pid}`, `{from}`, `{to}`, `{path}`.
struct Dialect {
    header: &'static str,
    sleep: &'static str,
    terminate: &'static str,
    move_file: &'static str,
    make_executable: Option<&'static str>,
    launch: &'static str,
    remove: &'static str,
    remove_self: &'static str,
    newline: &'static str,
    quote: fn(&Path) -> String,
}

const BATCH: Dialect = Dialect {
    header: "@echo off",
    // `timeout` rejects the null stdin of a detached process; ping waits ~1s per echo.
    sleep: "ping -n {pings} 127.0.0.1 > NUL",
    terminate: "taskkill /F /PID {pid} > NUL 2>&1",
    move_file: "move /Y {from} {to} > NUL",
    make_executable: None,
    launch: "start \"\" {path}",
    remove: "del /F /Q {path}",
    remove_self: "(goto) 2>nul & del \"%~f0\"",
    newline: "\r\n",
    quote: quote_batch,
};

const POSIX_SH: Dialect = Dialect {
    header: "#!/bin/sh",
    sleep: "sleep {secs}",
    terminate: "kill -9 {pid} 2>/dev/null",
    move_file: "mv -f {from} {to}",
    make_executable: Some("chmod +x {path}"),
    launch: "nohup {path} >/dev/null 2>&1 &",
    remove: "rm -f {path}",
    remove_self: "rm -f \"$0\"",
    newline: "\n",
    quote: quote_sh,
};

fn dialect(platform: Platform) -> &'static Dialect {
    match platform {
        Platform::Windows => &BATCH,
        Platform::Linux => &POSIX_SH,
    }
}

fn quote_batch(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

fn quote_sh(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

/// Substitutes `{key}` placeholders in one left-to-right pass, so values are
/// never rescanned.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find_map(|(key, value)| {
            tail.strip_prefix('{')
                .and_then(|t| t.strip_prefix(key))
                .and_then(|t| t.strip_prefix('}'))
                .map(|after| (*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// File name of the handoff script for `platform`.
pub fn script_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "update.bat",
        Platform::Linux => "update.sh",
    }
}

/// Ordered handoff procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffPlan {
    pub steps: Vec<HandoffStep>,
}

impl HandoffPlan {
    /// Replace `current_exe` with `downloaded`, restart it, and clean up.
    pub fn replace_executable(current_exe: &Path, downloaded: &Path, pid: u32) -> Self {
        let mut backup = current_exe.as_os_str().to_owned();
        backup.push(".");
        backup.push(constants::BACKUP_SUFFIX);
        let backup = PathBuf::from(backup);

        Self {
            steps: vec![
                HandoffStep::Sleep {
                    secs: constants::HANDOFF_DELAY_SECS,
                },
                HandoffStep::Terminate { pid },
                HandoffStep::Move {
                    from: current_exe.to_path_buf(),
                    to: backup.clone(),
                },
                HandoffStep::Move {
                    from: downloaded.to_path_buf(),
                    to: current_exe.to_path_buf(),
                },
                HandoffStep::MakeExecutable {
                    path: current_exe.to_path_buf(),
                },
                HandoffStep::Launch {
                    path: current_exe.to_path_buf(),
                },
                HandoffStep::Remove { path: backup },
                HandoffStep::RemoveSelf,
            ],
        }
    }

    /// Renders the plan as script text for `platform`.
    pub fn render(&self, platform: Platform) -> String {
        let d = dialect(platform);
        let q = d.quote;
        let mut lines = vec![d.header.to_string()];

        for step in &self.steps {
            let line = match step {
                HandoffStep::Sleep { secs } => fill(
                    d.sleep,
                    &[
                        ("secs", secs.to_string().as_str()),
                        ("pings", secs.saturating_add(1).to_string().as_str()),
                    ],
                ),
                HandoffStep::Terminate { pid } => {
                    fill(d.terminate, &[("pid", pid.to_string().as_str())])
                }
                HandoffStep::Move { from, to } => {
                    fill(d.move_file, &[("from", q(from).as_str()), ("to", q(to).as_str())])
                }
                HandoffStep::MakeExecutable { path } => match d.make_executable {
                    Some(template) => fill(template, &[("path", q(path).as_str())]),
                    None => continue,
                },
                HandoffStep::Launch { path } => fill(d.launch, &[("path", q(path).as_str())]),
                HandoffStep::Remove { path } => fill(d.remove, &[("path", q(path).as_str())]),
                HandoffStep::RemoveSelf => d.remove_self.to_string(),
            };
            lines.push(line);
        }

        let mut script = lines.join(d.newline);
        script.push_str(d.newline);
        script
    }
}
