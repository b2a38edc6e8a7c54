//! Log output: colored stdout plus daily-rolled `main.*.log` and `errors.*.log`,
//! each keeping the last ten days.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Rolled files kept per sink before the oldest is deleted
pub const LOG_RETENTION_DAYS: usize = 10;

/// Keeps the background log writers alive; dropping it flushes the files.
pub struct LogGuards {
    _main: WorkerGuard,
    _errors: WorkerGuard,
}

/// Daily appender writing `<prefix>.YYYY-MM-DD.log` under `log_dir`.
fn rolling_writer(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(LOG_RETENTION_DAYS)
        .build(log_dir)
        .context(format!("Failed to open {} log in {}", prefix, log_dir.display()))
}

/// Build the subscriber without installing it.
pub fn build_subscriber(
    log_dir: impl AsRef<Path>,
    filter: EnvFilter,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuards)> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir).context(format!(
        "Failed to create log directory {}",
        log_dir.display()
    ))?;

    let (main_writer, main_guard) =
        tracing_appender::non_blocking(rolling_writer(log_dir, "main")?);
    let (errors_writer, errors_guard) =
        tracing_appender::non_blocking(rolling_writer(log_dir, "errors")?);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(main_writer))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(errors_writer)
                .with_filter(LevelFilter::ERROR),
        );

    Ok((
        subscriber,
        LogGuards {
            _main: main_guard,
            _errors: errors_guard,
        },
    ))
}

/// Install the global subscriber. `RUST_LOG` extends the default
/// `translator_bot=info` directive.
pub fn init(log_dir: &str) -> Result<LogGuards> {
    let filter = EnvFilter::from_default_env().add_directive("translator_bot=info".parse()?);
    let (subscriber, guards) = build_subscriber(log_dir, filter)?;
    subscriber
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(guards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Concatenate every rolled file whose name starts with `prefix`
    fn read_logs(dir: &Path, prefix: &str) -> String {
        let mut contents = String::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            if entry.file_name().to_string_lossy().starts_with(prefix) {
                contents.push_str(&std::fs::read_to_string(entry.path()).unwrap());
            }
        }
        contents
    }

    #[test]
    fn test_creates_missing_log_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let log_dir = temp_dir.path().join("nested").join("logs");

        let (_subscriber, _guards) =
            build_subscriber(&log_dir, EnvFilter::new("info")).expect("Should build");
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_rolling_writer_names_dated_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut writer = rolling_writer(temp_dir.path(), "main").expect("Should build");
        std::io::Write::write_all(&mut writer, b"hello\n").unwrap();
        std::io::Write::flush(&mut writer).unwrap();

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("main."));
        assert!(names[0].ends_with(".log"));
    }

    #[test]
    fn test_errors_log_only_gets_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let (subscriber, guards) =
            build_subscriber(temp_dir.path(), EnvFilter::new("info")).expect("Should build");
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("translation requested by user 7");
            tracing::error!("rate limit reached for user 7");
        });
        // Flush the background writers
        drop(guards);

        let main = read_logs(temp_dir.path(), "main.");
        let errors = read_logs(temp_dir.path(), "errors.");

        assert!(main.contains("translation requested by user 7"));
        assert!(main.contains("rate limit reached for user 7"));
        assert!(errors.contains("rate limit reached for user 7"));
        assert!(!errors.contains("translation requested"));
    }
}
