//! Session log
//!
//! One append-only log file per installation. Each run writes a session
//! start marker, then every `tracing` event at or above the configured
//! level, and a session end marker when the returned guard is dropped.
//! Panics are written to the same file with a backtrace.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const SESSION_START: &str = "--- session start ---";
const SESSION_END: &str = "--- session end ---";
const RULE: &str = "==================================================";

/// Shared handle to the open log file
#[derive(Clone)]
pub struct LogFile {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl LogFile {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a raw line, bypassing the subscriber
    pub fn write_line(&self, line: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
            let _ = file.flush();
        }
    }
}

/// Writer handed to the fmt layer for each event
pub struct LogWriter(Arc<Mutex<File>>);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut file) => file.write(buf),
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut file) => file.flush(),
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(Arc::clone(&self.file))
    }
}

/// Writes the session end marker on drop
pub struct SessionGuard {
    log: LogFile,
}

impl SessionGuard {
    pub fn log(&self) -> &LogFile {
        &self.log
    }

    /// Record a fatal error with its full cause chain
    pub fn fatal(&self, err: &anyhow::Error) {
        self.log.write_line(RULE);
        self.log.write_line("Critical error, the application will exit.");
        self.log.write_line(&format!("{:?}", err));
        self.log.write_line(RULE);
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.log.write_line(SESSION_END);
    }
}

/// Install the global subscriber writing to `path`
///
/// `RUST_LOG` overrides `level` when set.
pub fn init(path: &Path, level: &str) -> Result<SessionGuard> {
    let log = LogFile::open(path)?;
    log.write_line(SESSION_START);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log.clone())
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    install_panic_hook(log.clone());
    Ok(SessionGuard { log })
}

fn install_panic_hook(log: LogFile) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log.write_line(RULE);
        log.write_line(&format!("Unhandled panic: {}", info));
        log.write_line(&backtrace.to_string());
        log.write_line(RULE);
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/error_log.txt");
        {
            let log = LogFile::open(&path).unwrap();
            log.write_line("first");
        }
        {
            let log = LogFile::open(&path).unwrap();
            let guard = SessionGuard { log };
            guard.fatal(&anyhow::anyhow!("boom").context("loading floor"));
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("first\n"));
        assert!(content.contains("loading floor"));
        assert!(content.contains("boom"));
        assert!(content.trim_end().ends_with(SESSION_END));
    }

    // the only test that installs the global subscriber
    #[test]
    fn test_init_writes_markers_and_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/error_log.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "earlier run\n").unwrap();

        let guard = init(&path, "debug").unwrap();
        tracing::info!("Loaded floor {}", 3);
        tracing::debug!("Point added: (1, 2)");
        assert_eq!(guard.log().path(), path.as_path());
        drop(guard);

        let content = std::fs::read_to_string(&path).unwrap();
        let start = content.find(SESSION_START).unwrap();
        assert!(content.starts_with("earlier run\n"));
        assert!(content[start..].contains("Loaded floor 3"));
        assert!(content[start..].contains("Point added: (1, 2)"));
        assert!(content.trim_end().ends_with(SESSION_END));
        assert!(init(&path, "debug").is_err());
    }

    #[test]
    fn test_make_writer_shares_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error_log.txt");
        let log = LogFile::open(&path).unwrap();
        let mut writer = log.make_writer();
        writer.write_all(b"[DEBUG] event\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[DEBUG] event\n");
        assert_eq!(log.path(), path.as_path());
    }
}
