//! Core logger types and traits

pub mod builder;
pub mod config;
pub mod encoder;
pub mod error;
pub mod exit;
pub mod field;
pub mod global;
pub mod hook;
pub mod level;
pub mod logger;
pub mod manager;
pub mod metrics;
pub mod pool;
pub mod record;
pub mod sampling;
pub mod timestamp;
pub mod valuer;
pub mod writer;

pub use builder::LogBuilder;
pub use config::{new_simple_logger, parse_size, LoggerConfig, OutputFormat};
pub use encoder::Encoder;
pub use error::{LoggerError, Result};
pub use exit::{register_exit_hook, reset_terminator, run_exit_hooks, set_terminator, FATAL_EXIT_CODE};
pub use field::{err_field, field, Field, FieldValue, LazyValue, Valuer};
pub use hook::{disable_logger, enable_logger, hook, min_level_for, Hook};
pub use level::{register_level, register_level_alias, registered_levels, set_fallback_level, Level};
pub use logger::{LogWriter, Logger, LoggerBuilder, Outcome};
pub use manager::Manager;
pub use metrics::{LoggerMetrics, PoolMetrics};
pub use pool::{BufferPool, FieldBuffer, FieldPool, Pools, ScratchBuffer};
pub use record::{CallSite, PanicRecord, Record};
pub use sampling::{sample, sampler_hook, Adaptive, Sampler, SamplerMetrics, SamplingConfig};
pub use timestamp::TimestampFormat;
pub use writer::Writer;
