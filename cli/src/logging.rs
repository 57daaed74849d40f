use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "textlabel.log";

/// Send `tracing` output to `textlabel.log` under `dir`, filtered by `RUST_LOG`.
///
/// The terminal belongs to the UI, so when the log file cannot be opened logging stays off.
pub fn init(dir: &Path) {
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }
    let log_path = dir.join(LOG_FILE_NAME);
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    if installed.is_ok() {
        tracing::debug!(path = ?log_path, "logging initialized");
    }
}
