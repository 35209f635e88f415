pub mod boundary_logger;
pub mod trace_context;

pub use boundary_logger::{BoundaryLogger, Timer};
pub use trace_context::TraceContext;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber: human-readable stdout, plus a daily
/// rolling JSON file under `log_dir` when one is configured.
///
/// The returned guard flushes the file writer on drop and must be held
/// for the life of the process.
pub fn init(log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let stdout = tracing_subscriber::fmt::layer().boxed();

    let (file, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, "runner-survey.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
