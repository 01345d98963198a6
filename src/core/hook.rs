//! Hooks: predicates deciding whether a logger may emit at a level
//!
//! Hooks run after the level check and before any allocation, so they must
//! be pure and cheap. Every hook of a logger has to return `true` for a
//! record to be emitted.

use super::level::Level;
use std::collections::HashSet;
use std::sync::Arc;

pub type Hook = Arc<dyn Fn(&str, Level) -> bool + Send + Sync>;

/// Wrap a closure as a [`Hook`]
pub fn hook<F>(f: F) -> Hook
where
    F: Fn(&str, Level) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Reject every record from the named loggers
///
/// # Example
///
/// ```
/// use rust_kvlog::{disable_logger, Level};
///
/// let hook = disable_logger(["db"]);
/// assert!(!hook("db", Level::ERROR));
/// assert!(hook("http", Level::ERROR));
/// ```
pub fn disable_logger<I, S>(names: I) -> Hook
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: HashSet<String> = names.into_iter().map(Into::into).collect();
    Arc::new(move |name, _| !names.contains(name))
}

/// Only let the named loggers through
pub fn enable_logger<I, S>(names: I) -> Hook
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: HashSet<String> = names.into_iter().map(Into::into).collect();
    Arc::new(move |name, _| names.contains(name))
}

/// Raise the threshold of one named logger without touching the others
pub fn min_level_for(logger: impl Into<String>, min: Level) -> Hook {
    let logger = logger.into();
    Arc::new(move |name, level| name != logger || level >= min)
}

#[inline]
pub(crate) fn allows(hooks: &[Hook], name: &str, level: Level) -> bool {
    hooks.iter().all(|hook| hook(name, level))
}
