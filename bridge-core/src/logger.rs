//! Tracing setup for the bridge.
//!
//! The long-running bridge tees every event to stdout and an append-only log file; one-shot CLI commands log
//! to the console only. Both read the level from `RUST_LOG`, so `.env` has to be loaded first.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

const DEFAULT_LEVEL: &str = "info";

fn level_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber for the bridge process: one fmt layer (level, target, thread, closed spans)
/// written to both stdout and `log_file_path`.
pub fn init_tracing(log_file_path: &str) -> anyhow::Result<()> {
    let file = open_log_file(Path::new(log_file_path))
        .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file_path, e))?;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout.and(Arc::new(file)))
        .with_span_events(FmtSpan::CLOSE)
        .with_thread_ids(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(level_filter())
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))
}

/// Console-only subscriber for short CLI commands. A no-op when a subscriber is already installed.
pub fn init_console_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level_filter())
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_directories_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("nested/logs/bridge.log");

        {
            use std::io::Write;
            let mut file = open_log_file(&log_path).unwrap();
            writeln!(file, "first").unwrap();
        }
        {
            use std::io::Write;
            let mut file = open_log_file(&log_path).unwrap();
            writeln!(file, "second").unwrap();
        }

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_init_tracing_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs/bridge.log");

        // Another test may already own the global subscriber; the file is created either way.
        let _ = init_tracing(log_path.to_str().unwrap());

        assert!(log_path.exists());
    }
}
