/// Nova3D Engine - global logging entry point
///
/// The engine keeps a single process-wide logger and a minimum severity.
/// Scene, resource and render code report through the `engine_*!` macros,
/// which all end up in `Engine::log` or `Engine::log_detailed`.

use std::sync::{OnceLock, RwLock};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity used until `Engine::set_log_level` is called
const DEFAULT_SEVERITY: LogSeverity = if cfg!(debug_assertions) {
    LogSeverity::Debug
} else {
    LogSeverity::Info
};

/// Minimum severity forwarded to the logger (stored as `LogSeverity as u8`)
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(DEFAULT_SEVERITY as u8);

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

fn severity_from_u8(value: u8) -> LogSeverity {
    match value {
        0 => LogSeverity::Trace,
        1 => LogSeverity::Debug,
        2 => LogSeverity::Info,
        3 => LogSeverity::Warn,
        _ => LogSeverity::Error,
    }
}

// ===== PUBLIC API =====

/// Global engine facade
///
/// # Example
///
/// ```no_run
/// use nova_3d_engine::nova3d::Engine;
/// use nova_3d_engine::nova3d::log::LogSeverity;
///
/// Engine::set_log_level(LogSeverity::Debug);
/// Engine::log(LogSeverity::Info, "app", "scene loaded".to_string());
/// ```
pub struct Engine;

impl Engine {
    // ===== LOGGING =====

    /// Replace the global logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nova_3d_engine::nova3d::Engine;
    /// use nova_3d_engine::nova3d::log::{Logger, LogEntry};
    ///
    /// struct Silent;
    /// impl Logger for Silent {
    ///     fn log(&self, _entry: &LogEntry) {}
    /// }
    ///
    /// Engine::set_logger(Silent);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Restore the colored console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Set the minimum severity forwarded to the logger
    ///
    /// Messages below this level are dropped before an entry is built.
    /// Defaults to `Debug` in debug builds and `Info` in release builds.
    pub fn set_log_level(severity: LogSeverity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn log_level() -> LogSeverity {
        severity_from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Whether a message of this severity would reach the logger
    pub fn log_enabled(severity: LogSeverity) -> bool {
        severity as u8 >= MIN_SEVERITY.load(Ordering::Relaxed)
    }

    /// Log a message (used by the engine_* macros)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if !Self::log_enabled(severity) {
            return;
        }
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log a message with file:line information (used by engine_error!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if !Self::log_enabled(severity) {
            return;
        }
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
