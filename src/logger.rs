//! Centralized activity log.
//!
//! Every operation result ends up here: the boundary layer shows the entries
//! to the user, and when a log directory is configured each entry is also
//! appended to a daily file under `<config_dir>/logs/`.

use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::constants;
use crate::utils;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Success => write!(f, "OK"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A single activity log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Process-wide sequence number, starting at 1.
    pub seq: u64,
    pub timestamp: String,
    pub level: LogLevel,
    pub category: String,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp, self.level, self.category, self.message
        )
    }
}

struct FileSink {
    dir: PathBuf,
    retention: Duration,
}

static ENTRIES: Mutex<VecDeque<LogEntry>> = Mutex::new(VecDeque::new());
static SINK: Mutex<Option<FileSink>> = Mutex::new(None);
static CLEANUP_COUNTER: AtomicU32 = AtomicU32::new(0);
static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Enables appending to daily log files in `log_dir`.
pub fn init(log_dir: &Path, retention_days: u64) {
    if std::fs::create_dir_all(log_dir).is_err() {
        return;
    }
    let retention = retention_window(retention_days);
    if let Ok(mut sink) = SINK.lock() {
        *sink = Some(FileSink {
            dir: log_dir.to_path_buf(),
            retention,
        });
    }
    cleanup_old_logs(log_dir, retention);
}

fn retention_window(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(86_400))
}

/// Records an entry in memory and, if configured, on disk.
pub fn log(level: LogLevel, category: &str, message: impl Into<String>) {
    let entry = LogEntry {
        seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
        timestamp: utils::format_now(),
        level,
        category: category.to_string(),
        message: message.into(),
    };

    append_to_log_file(&entry);

    if let Ok(mut entries) = ENTRIES.lock() {
        if entries.len() >= constants::MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

/// Snapshot of the in-memory log, oldest first.
pub fn get_logs() -> Vec<LogEntry> {
    ENTRIES
        .lock()
        .map(|entries| entries.iter().cloned().collect())
        .unwrap_or_default()
}

/// Entries recorded after sequence number `after`, oldest first.
pub fn get_logs_since(after: u64) -> Vec<LogEntry> {
    ENTRIES
        .lock()
        .map(|entries| entries.iter().filter(|e| e.seq > after).cloned().collect())
        .unwrap_or_default()
}

/// Empties the in-memory log. Files are left alone.
pub fn clear_logs() {
    if let Ok(mut entries) = ENTRIES.lock() {
        entries.clear();
    }
}

/// Append log entry to file with automatic rotation
fn append_to_log_file(entry: &LogEntry) {
    let Ok(sink) = SINK.lock() else {
        return;
    };
    let Some(sink) = sink.as_ref() else {
        return;
    };

    let today = utils::today();
    let log_file = sink.dir.join(format!("{}-{today}.log", constants::APP_NAME));

    if let Ok(metadata) = std::fs::metadata(&log_file) {
        if metadata.len() > constants::LOG_ROTATE_BYTES {
            let rotated = sink.dir.join(format!("{}-{today}.1.log", constants::APP_NAME));
            let _ = std::fs::rename(&log_file, rotated);
        }
    }

    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
    {
        let _ = writeln!(file, "{entry}");
    }

    let count = CLEANUP_COUNTER.fetch_add(1, Ordering::Relaxed);
    if count % 100 == 99 {
        cleanup_old_logs(&sink.dir, sink.retention);
    }
}

/// Remove log files older than the retention window
fn cleanup_old_logs(log_dir: &Path, retention: Duration) {
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    if let Ok(entries) = std::fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let is_log = entry.path().extension().is_some_and(|ext| ext == "log");
            if !is_log {
                continue;
            }
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                if modified < cutoff {
                    let _ = std::fs::remove_file(entry.path());
                }
            }
        }
    }
}
