//! `log` backend shared by the browser and CLI hosts
//!
//! Lines look like:
//!
//! ```text
//! [2025-09-29T10:00:00.000Z] [INFO] [TrackingTokenStripper] [+0.42ms] Redirect completed using replaceState
//! ```
//!
//! Records under the [`PERF_TARGET`] target are labelled `PERF`.

use std::fmt;

use crate::clock::{format_timestamp, Clock};
use crate::config::MODULE_NAME;

/// Target used for timing records.
pub const PERF_TARGET: &str = "tts::perf";

/// Destination for formatted lines.
pub trait LogSink: Send + Sync {
    fn write_line(&self, level: log::Level, line: &str);
}

/// Format one log line.
pub fn format_line(now_ms: u64, label: &str, elapsed_ms: f64, message: &fmt::Arguments<'_>) -> String {
    format!(
        "[{}] [{}] [{}] [+{:.2}ms] {}",
        format_timestamp(now_ms),
        label,
        MODULE_NAME,
        elapsed_ms,
        message
    )
}

fn label_for(record: &log::Record<'_>) -> &'static str {
    if record.target() == PERF_TARGET {
        return "PERF";
    }
    match record.level() {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN",
        log::Level::Info => "INFO",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

/// Logger that stamps each record with wall time and time since start.
pub struct StripLogger<K: LogSink, C: Clock + Send + Sync> {
    sink: K,
    clock: C,
    start_ms: f64,
    level: log::LevelFilter,
}

impl<K: LogSink, C: Clock + Send + Sync> StripLogger<K, C> {
    pub fn new(sink: K, clock: C, level: log::LevelFilter) -> Self {
        let start_ms = clock.precise_ms();
        Self {
            sink,
            clock,
            start_ms,
            level,
        }
    }

    pub fn level(&self) -> log::LevelFilter {
        self.level
    }

    pub fn render(&self, record: &log::Record<'_>) -> String {
        format_line(
            self.clock.now_ms(),
            label_for(record),
            self.clock.precise_ms() - self.start_ms,
            record.args(),
        )
    }
}

impl<K: LogSink, C: Clock + Send + Sync> log::Log for StripLogger<K, C> {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.sink.write_line(record.level(), &self.render(record));
        }
    }

    fn flush(&self) {}
}

/// Install `logger` as the global `log` backend.
pub fn install<K, C>(logger: &'static StripLogger<K, C>) -> Result<(), log::SetLoggerError>
where
    K: LogSink + 'static,
    C: Clock + Send + Sync + 'static,
{
    log::set_logger(logger)?;
    log::set_max_level(logger.level());
    Ok(())
}
