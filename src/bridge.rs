//! Route the `log` crate facade into a [`Logger`]
//!
//! ```no_run
//! use rust_kvlog::bridge::install_log_bridge;
//! use rust_kvlog::prelude::*;
//!
//! install_log_bridge(Logger::default(), log::LevelFilter::Info).unwrap();
//! log::info!("served through rust_kvlog");
//! ```

use crate::core::{CallSite, Field, Level, Logger, LoggerError, Result};

/// Map a `log` level onto the level with the same meaning
pub fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::ERROR,
        log::Level::Warn => Level::WARN,
        log::Level::Info => Level::INFO,
        log::Level::Debug => Level::DEBUG,
        log::Level::Trace => Level::TRACE,
    }
}

/// A `log::Log` implementation writing through a [`Logger`]
///
/// The record target becomes the `target` field and the record's file and
/// line become the call site.
#[derive(Debug, Clone)]
pub struct LogBridge {
    logger: Logger,
}

impl LogBridge {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.is_enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let level = map_level(record.level());
        if !self.logger.is_enabled(level) {
            return;
        }

        let site = CallSite::new(
            record.file().unwrap_or("???"),
            record.line().unwrap_or(0),
            0,
        );
        let formatted;
        let message = match record.args().as_str() {
            Some(message) => message,
            None => {
                formatted = record.args().to_string();
                &formatted
            }
        };
        let target = Field::new("target", record.target().to_string());

        if let Err(e) = self.logger.log_at(level, message, [target], site) {
            eprintln!("[LOGGER ERROR] {}: {}", self.logger.writer().name(), e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.logger.flush() {
            eprintln!("[LOGGER ERROR] {}: {}", self.logger.writer().name(), e);
        }
    }
}

/// Install a [`LogBridge`] as the `log` crate's global logger
///
/// # Errors
///
/// Returns `InvalidConfiguration` if a `log` logger is already installed
pub fn install_log_bridge(logger: Logger, max_level: log::LevelFilter) -> Result<()> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))
        .map_err(|e| LoggerError::config("log bridge", e.to_string()))?;
    log::set_max_level(max_level);
    Ok(())
}
