//! Logging for markon runs
//!
//! Two sinks share one `tracing` registry:
//! - stderr, filtered by RUST_LOG and quiet (`warn`) when it is unset, so a
//!   rendered HTML written to stdout stays clean
//! - `markon.log` in `~/.config/markon/logs/`, rolled daily and always kept
//!   at `debug`
//!
//! Useful RUST_LOG targets:
//! - `markon::sync=trace` shows each scroll frame, including lines with no
//!   matching preview element
//! - `markon::storage=trace` shows every message posted to the storage
//!   worker and each slot written to disk
//! - `markon::syntax=trace` shows grammar lookups and code blocks left plain

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the stderr and log file sinks. Without a logs dir only stderr
/// is used.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, "markon.log");
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("markon: logging to stderr only ({})", e);
            None
        }
    };

    // try_init: a host that already installed a subscriber keeps it
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
