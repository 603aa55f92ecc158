use crate::Result;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::fmt::time::{uptime, UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

// dependencies only report warnings unless RUST_LOG says otherwise
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(concat!("warn,", env!("CARGO_PKG_NAME"), "=info")))
}

/// Compact terminal output timed from startup, plus an optional
/// `<filename>.log` in `output_dir` with UTC timestamps and no colors.
pub fn init_tracing_subscriber(
    save_logs_file: bool,
    output_dir: &Path,
    filename: &str,
) -> Result<()> {
    let terminal = layer()
        .compact()
        .with_timer(uptime())
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    let file = save_logs_file.then(|| {
        let file_appender =
            RollingFileAppender::new(Rotation::NEVER, output_dir, format!("{}.log", filename));
        layer()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_target(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(file_appender)
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter())
        .with(terminal)
        .with(file);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_written_and_subscriber_set_once() {
        let dir = tempfile::tempdir().unwrap();

        init_tracing_subscriber(true, dir.path(), "run").unwrap();
        tracing::error!("written to the log file");

        let log = dir.path().join("run.log");
        assert!(log.is_file());
        assert!(std::fs::read_to_string(&log)
            .unwrap()
            .contains("written to the log file"));

        assert!(init_tracing_subscriber(false, dir.path(), "again").is_err());
    }
}
