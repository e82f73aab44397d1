//! Subscriber setup: stderr always, `{base_dir}/log.txt` when logging is enabled.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const DEFAULT_DIRECTIVE: &str = "assembly_transcriber=info";

/// Timestamp format for log file lines, e.g. `2024-05-01 09:30:00`.
const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Install the global subscriber. If the log file cannot be opened the run
/// continues with stderr only.
pub fn init(log_file: Option<&Path>) {
    let file_layer = log_file.and_then(|path| match file_layer(path) {
        Ok(layer) => Some(layer),
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", path.display());
            None
        }
    });

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

/// Layer appending plain-text, locally timestamped lines to `path`.
pub fn file_layer(path: &Path) -> io::Result<Box<dyn Layer<Registry> + Send + Sync>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
        .with_writer(Mutex::new(file))
        .boxed())
}
