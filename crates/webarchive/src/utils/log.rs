use crate::utils::ensure_dir;
use crate::Result;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "webarchive";

/// Console logging, plus `{log_dir}/webarchive.log` when the directory is
/// writable. `RUST_LOG` wins over `level`.
/// Returns false when logs only go to the console.
pub fn init_tracing_subscriber(level: &str, log_dir: Option<&Path>) -> Result<bool> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // base for the subscriber
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_file(false)
        .with_target(false);

    match log_dir.and_then(open_log_file) {
        Some(file_appender) => {
            let subscriber = subscriber.finish();

            // the log file gets its own layer without colors
            let file_layer = layer()
                .with_ansi(false)
                .with_file(false)
                .with_target(false)
                .with_writer(file_appender);

            tracing::subscriber::set_global_default(subscriber.with(file_layer))?;
            Ok(true)
        }
        None => {
            tracing::subscriber::set_global_default(subscriber.finish())?;
            Ok(false)
        }
    }
}

fn open_log_file(log_dir: &Path) -> Option<RollingFileAppender> {
    ensure_dir(log_dir).ok()?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .ok()
}
