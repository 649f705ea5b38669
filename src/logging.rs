// 📝 Logging - tracing subscriber setup
// Interactive mode logs to a file so output never lands on the alternate screen

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing_subscriber::{fmt, EnvFilter};

/// Log file used while the TUI owns the terminal
pub const LOG_FILE: &str = "receipt-splitter.log";

static TRACING_INIT: Once = Once::new();

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("receipt_splitter=info"))
}

/// Log to stderr (command mode)
pub fn init_stderr() {
    TRACING_INIT.call_once(|| {
        fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    });
}

/// Append logs to `path` (interactive mode)
pub fn init_file(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    TRACING_INIT.call_once(|| {
        fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_file_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitter.log");

        init_file(&path).unwrap();
        tracing::info!(target: "receipt_splitter", "log file smoke event");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("log file smoke event"), "{}", content);
    }

    #[test]
    fn test_init_file_unwritable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init_file(&dir.path().join("missing").join("x.log")).is_err());
    }
}
