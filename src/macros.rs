//! Logging macros with `format!`-style messages.
//!
//! The message is only formatted if the record passes the logger's level and
//! hooks.
//!
//! # Examples
//!
//! ```
//! use rust_kvlog::prelude::*;
//! use rust_kvlog::info;
//!
//! let logger = Logger::new(DiscardWriter);
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a formatted message at any level.
///
/// # Examples
///
/// ```
/// # use rust_kvlog::prelude::*;
/// # let logger = Logger::new(DiscardWriter);
/// use rust_kvlog::log;
/// log!(logger, Level::INFO, "Simple message");
/// log!(logger, Level::ERROR, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_builder($level).msg_fmt(::std::format_args!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::TRACE, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_kvlog::prelude::*;
/// # let logger = Logger::new(DiscardWriter);
/// use rust_kvlog::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::INFO, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARN, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ERROR, $($arg)+)
    };
}

/// Log a fatal message, run the exit hooks and exit.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::FATAL, $($arg)+)
    };
}
