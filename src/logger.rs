/*============================================================
  Synavera Project: Explain
  Module: explain_core::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging for the explain
    CLI session and the library's stderr diagnostic channel.
    Entries are single lines: control bytes in messages (which
    often quote caller pathnames) are escaped.

  Security / Safety Notes:
    The library only logs when the debug option is set, and
    only to stderr. File logging is a CLI opt-in.

  Dependencies:
    std::fs::File, std::sync::Mutex, chrono for timestamps,
    sha2 for integrity hashing.

  Operational Scope:
    Session logs for the binary entry point; diagnostics for
    option parsing, ioctl registry checks and the path walker.

  Revision History:
    2026-10-18 COD  Adapted logger for Explain diagnostics.
    2026-10-18 COD  Library channel, level threshold, escaped entries.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{ExplainError, Result};

/// Structured log level for Explain events, most severe first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Session logger: every entry goes to the optional file, entries at
/// or above `echo` also go to stderr.
pub struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    echo: LogLevel,
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            ExplainError::Filesystem(format!("Failed to create log directory {}: {err}", parent.display()))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| ExplainError::Filesystem(format!("Failed to open log file {}: {err}", path.display())))
}

/// Keep one entry on one line whatever bytes a pathname carried.
fn escape_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

impl Logger {
    /// A session logger; `verbose` echoes INFO and DEBUG entries too.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let file = path.as_deref().map(open_append).transpose()?;
        Ok(Self {
            file: file.map(|f| Mutex::new(BufWriter::new(f))),
            path,
            echo: if verbose { LogLevel::Debug } else { LogLevel::Warn },
        })
    }

    /// Format a log line without emitting it.
    pub fn format_entry(level: LogLevel, code: &str, message: &str) -> String {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        format!("{timestamp} [{}] [{code}] {}", level.as_str(), escape_message(message))
    }

    /// The library's channel: stderr only, no session state. Callers
    /// gate it on the debug option.
    pub fn diagnostic<S: AsRef<str>>(level: LogLevel, code: &str, message: S) {
        eprintln!("{}", Self::format_entry(level, code, message.as_ref()));
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let entry = Self::format_entry(level, code, message.as_ref());
        if level <= self.echo {
            eprintln!("{entry}");
        }
        if let Err(problem) = self.append(&entry) {
            Self::diagnostic(LogLevel::Error, "LOGGER", problem);
        }
    }

    fn append(&self, entry: &str) -> std::result::Result<(), &'static str> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let mut guard = file.lock().map_err(|_| "log writer lock poisoned")?;
        writeln!(guard, "{entry}").map_err(|_| "Failed to write to log file")?;
        guard.flush().map_err(|_| "Failed to flush log writer")
    }

    /// Convenience wrapper for `INFO` level events.
    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    /// Convenience wrapper for `WARN` level events.
    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    /// Convenience wrapper for `DEBUG` level events.
    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write a `sha256sum`-style sidecar next to the session log and
    /// return the hex digest; None without a log file.
    pub fn finalize(&self) -> Result<Option<String>> {
        let Some(path) = self.path() else {
            return Ok(None);
        };
        let data = std::fs::read(path).map_err(|err| {
            ExplainError::Filesystem(format!("Failed to read log for hashing {}: {err}", path.display()))
        })?;
        let digest = format!("{:x}", Sha256::digest(&data));
        let mut sidecar = path.as_os_str().to_os_string();
        sidecar.push(".hash");
        let sidecar = PathBuf::from(sidecar);
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        std::fs::write(&sidecar, format!("{digest}  {name}\n")).map_err(|err| {
            ExplainError::Filesystem(format!("Failed to write hash file {}: {err}", sidecar.display()))
        })?;
        Ok(Some(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn entries_carry_level_and_code() {
        let line = Logger::format_entry(LogLevel::Warn, "OPTIONS", "unknown option");
        assert!(line.ends_with("[WARN] [OPTIONS] unknown option"));
    }

    #[test]
    fn pathnames_cannot_split_an_entry() {
        let line = Logger::format_entry(LogLevel::Debug, "WALK", "lstat \"a\nb\u{1b}\" failed");
        assert!(line.ends_with("[DEBUG] [WALK] lstat \"a\\nb\\x1b\" failed"), "{line}");
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn severity_orders_the_stderr_threshold() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        let quiet = Logger::new(None, false).unwrap();
        assert_eq!(quiet.echo, LogLevel::Warn);
        assert!(quiet.path().is_none());
        assert_eq!(quiet.finalize().unwrap(), None);
    }

    #[test]
    fn finalize_writes_digest_sidecar() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("session.log");
        let logger = Logger::new(Some(path.clone()), false).expect("logger");
        logger.info("INIT", "hello");
        let digest = logger.finalize().expect("finalize").expect("digest");

        let contents = std::fs::read_to_string(&path).expect("log");
        assert!(contents.trim_end().ends_with("[INFO] [INIT] hello"), "{contents}");
        let hash = std::fs::read_to_string(dir.path().join("logs").join("session.log.hash"))
            .expect("hash file");
        assert_eq!(hash, format!("{digest}  session.log\n"));
        assert_eq!(digest.len(), 64);
    }
}
