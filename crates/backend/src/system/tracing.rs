use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Инициализация системы трассировки для HTTP сервера
///
/// Логи пишутся в:
/// - stdout (с цветами)
/// - `<log_dir>/backend.log` (без цветов)
pub fn initialize(log_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        anyhow::anyhow!("Cannot create log directory {}: {}", log_dir.display(), e)
    })?;

    let log_file_path = log_dir.join("backend.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| anyhow::anyhow!("Cannot open log file {}: {}", log_file_path.display(), e))?;

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    println!("✓ Logging to stdout and {} (level: {})", log_file_path.display(), log_level);

    Ok(())
}

/// Трассировка для CLI: только stderr, чтобы не смешиваться с выводом прогресса
pub fn initialize_cli(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
