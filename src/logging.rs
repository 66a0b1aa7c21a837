//! Tracing subscriber setup for the command-line binary.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. When a log directory is
/// configured and writable, logs are also written to a daily-rotated
/// `cdsim.log` there; the returned guard must be held until exit so buffered
/// lines get flushed.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},cdsim=debug", config.level)));

    let console_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let mut guard = None;
    let file_layer = match config.dir.as_ref() {
        Some(dir) => match open_log_file(dir) {
            Ok(file_appender) => {
                let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
                guard = Some(worker_guard);

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    dir.display(),
                    e
                );
                None
            }
        },
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(filter)
        .try_init();

    guard
}

/// Daily-rotated `cdsim.log` in `dir`.
///
/// `rolling::daily` panics when the first file cannot be created, so the
/// fallible builder is used and the caller decides what to do on error.
fn open_log_file(dir: &Path) -> std::io::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("cdsim.log")
        .build(dir)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Minimal logging for one-shot commands
pub fn init_logging_simple() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_in_writable_dir() {
        let dir = std::env::temp_dir().join(format!("cdsim-log-test-{}", std::process::id()));
        assert!(open_log_file(&dir).is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_open_log_file_in_unwritable_dir() {
        assert!(open_log_file(Path::new("/proc")).is_err());
    }

    #[test]
    fn test_unwritable_dir_falls_back_to_console() {
        let config = LoggingConfig {
            dir: Some("/proc".into()),
            ..Default::default()
        };
        assert!(init_logging(&config).is_none());
    }
}
