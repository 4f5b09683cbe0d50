//! Logging initialization: console output stays reserved for the conversation.
//!
//! Reads `RUST_LOG` (level) and `LOG_FILE` (path) from env (e.g. via .env).
//! With `LOG_FILE` set, logs are appended to that file through a non-blocking
//! writer; otherwise only warnings and errors go to stderr.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Installs the global subscriber. Keep the returned guard alive until exit so
/// buffered file logs are flushed.
pub fn init(verbose: bool) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let default = if verbose { "switchyard=debug,cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let path = Path::new(&path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| format!("LOG_FILE has no file name: {}", path.display()))?;
        std::fs::create_dir_all(dir)?;
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).init();
        tracing::info!(path = %path.display(), "switchyard logging to file");
        return Ok(Some(guard));
    }

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(stderr_layer).init();
    Ok(None)
}
