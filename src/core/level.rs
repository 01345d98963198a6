//! Log level definitions and the process-wide level name registry
//!
//! A [`Level`] is an ordered priority with a display name. Equality, hashing
//! and ordering only look at the priority, so an alias such as `CRIT`
//! compares equal to [`Level::PANIC`].
//!
//! The name registry is meant to be populated at start-up, before loggers
//! are shared between threads. It is lock-guarded, but lookups racing a late
//! registration may observe either state.

use super::error::{LoggerError, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub struct Level {
    name: &'static str,
    priority: i32,
}

impl Level {
    pub const TRACE: Level = Level::new("TRACE", 0);
    pub const DEBUG: Level = Level::new("DEBUG", 100);
    pub const INFO: Level = Level::new("INFO", 200);
    pub const WARN: Level = Level::new("WARN", 300);
    pub const ERROR: Level = Level::new("ERROR", 400);
    /// Emitting at this level panics with a [`PanicRecord`](crate::core::PanicRecord)
    pub const PANIC: Level = Level::new("PANIC", 500);
    /// Emitting at this level runs the exit hooks and terminates the process
    pub const FATAL: Level = Level::new("FATAL", 600);
    /// Used by adapters that write without a level
    pub const MAX: Level = Level::new("MAX", i32::MAX);

    /// Create a level. The bigger the priority, the more severe the level.
    pub const fn new(name: &'static str, priority: i32) -> Self {
        Self { name, priority }
    }

    #[inline]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a registered level by name, case-insensitively.
    ///
    /// Unknown names resolve to the fallback level ([`Level::INFO`] unless
    /// changed with [`set_fallback_level`]).
    pub fn from_name(name: &str) -> Level {
        let table = LEVELS.read();
        table.find(name).unwrap_or(table.fallback)
    }

    /// Strict variant of [`Level::from_name`]
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::UnknownLevel`] if no level is registered under `name`.
    pub fn from_name_strict(name: &str) -> Result<Level> {
        LEVELS
            .read()
            .find(name)
            .ok_or_else(|| LoggerError::unknown_level(name))
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.priority.hash(state);
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Level::from_name_strict(s)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Level::from_name_strict(&name).map_err(serde::de::Error::custom)
    }
}

struct LevelTable {
    names: Vec<(&'static str, Level)>,
    fallback: Level,
}

impl LevelTable {
    fn builtin() -> Self {
        let names = vec![
            ("TRACE", Level::TRACE),
            ("DEBUG", Level::DEBUG),
            ("INFO", Level::INFO),
            ("WARN", Level::WARN),
            ("WARNING", Level::WARN),
            ("ERROR", Level::ERROR),
            ("PANIC", Level::PANIC),
            ("CRIT", Level::PANIC),
            ("CRITICAL", Level::PANIC),
            ("FATAL", Level::FATAL),
            ("EMERG", Level::FATAL),
            ("MAX", Level::MAX),
        ];
        Self {
            names,
            fallback: Level::INFO,
        }
    }

    fn find(&self, name: &str) -> Option<Level> {
        self.names
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, level)| *level)
    }

    fn insert(&mut self, name: &'static str, level: Level) {
        match self.names.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = level,
            None => self.names.push((name, level)),
        }
    }
}

static LEVELS: Lazy<RwLock<LevelTable>> = Lazy::new(|| RwLock::new(LevelTable::builtin()));

/// Register a custom level under its own name, replacing any level of the same name.
pub fn register_level(level: Level) {
    LEVELS.write().insert(level.name, level);
}

/// Register an additional lookup name for an existing level
pub fn register_level_alias(alias: &'static str, level: Level) {
    LEVELS.write().insert(alias, level);
}

/// Set the level [`Level::from_name`] returns for unknown names
pub fn set_fallback_level(level: Level) {
    LEVELS.write().fallback = level;
}

/// All registered (name, level) pairs, including aliases, sorted by priority
pub fn registered_levels() -> Vec<(&'static str, Level)> {
    let mut levels = LEVELS.read().names.clone();
    levels.sort_by_key(|(_, level)| *level);
    levels
}
