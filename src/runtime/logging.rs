use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Send `tracing` output to `<dir>/tapedeck.log`.
///
/// The terminal belongs to the TUI, so nothing is written to stderr.
/// `RUST_LOG` wins over `level`. Keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init_logging(dir: &Path, level: &str) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, "tapedeck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
