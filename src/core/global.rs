//! Process-wide logger handle
//!
//! The global logger is an immutable snapshot. [`logger`] returns a copy;
//! [`set_logger`] replaces the snapshot for later calls only, so handles
//! fetched or derived before the replacement keep logging the old way.
//!
//! ```
//! use rust_kvlog::global;
//! use rust_kvlog::prelude::*;
//!
//! global::set_logger(Logger::new(DiscardWriter).with_level(Level::WARN));
//! global::warn("disk almost full", [field("free_mb", 120)]);
//! ```

use super::error::Result;
use super::field::Field;
use super::level::Level;
use super::logger::{Logger, Outcome};
use super::manager::Manager;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

static GLOBAL: Lazy<RwLock<Logger>> = Lazy::new(|| RwLock::new(Logger::default()));
static MANAGER: Lazy<Manager> = Lazy::new(|| Manager::new(logger()));

/// A snapshot of the global logger
pub fn logger() -> Logger {
    GLOBAL.read().clone()
}

/// Replace the global logger, returning the previous one
pub fn set_logger(logger: Logger) -> Logger {
    std::mem::replace(&mut *GLOBAL.write(), logger)
}

/// The default manager; its root is the global logger at first use
pub fn manager() -> &'static Manager {
    &MANAGER
}

/// A named logger from the default manager
pub fn get_logger(name: &str) -> Logger {
    MANAGER.get_logger(name)
}

#[track_caller]
pub fn log<I: IntoIterator<Item = Field>>(level: Level, message: &str, fields: I) -> Result<Outcome> {
    logger().log(level, message, fields)
}

#[track_caller]
pub fn trace<I: IntoIterator<Item = Field>>(message: &str, fields: I) {
    logger().trace(message, fields)
}

#[track_caller]
pub fn debug<I: IntoIterator<Item = Field>>(message: &str, fields: I) {
    logger().debug(message, fields)
}

#[track_caller]
pub fn info<I: IntoIterator<Item = Field>>(message: &str, fields: I) {
    logger().info(message, fields)
}

#[track_caller]
pub fn warn<I: IntoIterator<Item = Field>>(message: &str, fields: I) {
    logger().warn(message, fields)
}

#[track_caller]
pub fn error<I: IntoIterator<Item = Field>>(message: &str, fields: I) {
    logger().error(message, fields)
}

#[track_caller]
pub fn panic<I: IntoIterator<Item = Field>>(message: &str, fields: I) {
    logger().panic(message, fields)
}

#[track_caller]
pub fn fatal<I: IntoIterator<Item = Field>>(message: &str, fields: I) {
    logger().fatal(message, fields)
}
