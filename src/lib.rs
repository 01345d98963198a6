//! # rust_kvlog
//!
//! A structured, level-based key-value logging library.
//!
//! ## Features
//!
//! - **Cheap when filtered**: level and hooks are checked before any field is
//!   built, formatted or allocated
//! - **Pooled emission**: field lists and encoder buffers are recycled
//! - **Lazy fields**: values and caller information computed only for
//!   records that are written
//! - **Pluggable output**: text and JSON encoders, stream, console and
//!   rotating file writers, and combinators over them
//!
//! ## Example
//!
//! ```
//! use rust_kvlog::prelude::*;
//!
//! let logger = Logger::new(DiscardWriter)
//!     .with_level(Level::INFO)
//!     .with_kv("service", "billing");
//!
//! logger.info("payment accepted", [field("amount", 42)]);
//! logger.debug_builder().k("skipped", true).msg("below the threshold");
//! ```

pub mod bridge;
pub mod core;
pub mod encoders;
pub mod macros;
pub mod writers;

pub use crate::core::global;

pub mod prelude {
    pub use crate::core::valuer;
    pub use crate::core::{
        disable_logger, enable_logger, err_field, field, hook, min_level_for, sample, Encoder,
        Field, FieldValue, Hook, Level, LogBuilder, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, Outcome, Record, Result, SamplingConfig, Writer,
    };
    pub use crate::encoders::{JsonEncoder, MapJsonEncoder, NopEncoder, TextEncoder};
    pub use crate::writers::{
        file_writer, writer_fn, BufferWriter, DiscardWriter, FailoverWriter, IoWriter,
        LevelWriter, SafeWriter, SizedRotatingFile, SplitWriter, StreamWriter,
    };
}

pub use crate::core::{
    disable_logger, enable_logger, err_field, field, hook, min_level_for, new_simple_logger,
    parse_size, register_exit_hook, sample, CallSite, Encoder, Field, FieldValue, Hook, Level,
    LogBuilder, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, Manager, Outcome,
    PanicRecord, Pools, Record, Result, SamplingConfig, TimestampFormat, Writer,
};
pub use crate::encoders::{JsonEncoder, MapJsonEncoder, TextEncoder};
pub use crate::writers::{DiscardWriter, IoWriter, SafeWriter, StreamWriter};
