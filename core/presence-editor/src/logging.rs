//! Logging setup.
//!
//! stdout carries the status protocol, so logs go to a daily file under the
//! presence data dir. stderr is only used when that dir can't be resolved.

use std::env;

use presence_core::config::get_data_dir;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PRESENCE_LOG";
const DEBUG_LOG_ENV: &str = "PRESENCE_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "presence-editor";

/// Installs the global subscriber. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init() -> Option<WorkerGuard> {
    let filter = filter_from_env();

    let appender = get_data_dir().map(|dir| dir.join("logs")).and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .build(dir)
            .ok()
    });

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .ok()?;
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
            None
        }
    }
}

fn filter_from_env() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_LOG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
