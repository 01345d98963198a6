//! Named logger registry
//!
//! A [`Manager`] hands out loggers derived from its root by name and keeps
//! them, so the same name always yields the same configuration. Bulk setters
//! replace the registered snapshots; loggers fetched earlier keep their old
//! configuration and callers re-fetch to observe changes.

use super::encoder::Encoder;
use super::field::{Field, FieldValue};
use super::hook::Hook;
use super::level::Level;
use super::logger::Logger;
use super::writer::Writer;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct Manager {
    root: RwLock<Logger>,
    loggers: RwLock<HashMap<String, Logger>>,
}

impl Manager {
    pub fn new(root: Logger) -> Self {
        Self {
            root: RwLock::new(root),
            loggers: RwLock::new(HashMap::with_capacity(8)),
        }
    }

    /// The logger registered under `name`, derived from the root on first use
    pub fn get_logger(&self, name: &str) -> Logger {
        if let Some(logger) = self.loggers.read().get(name) {
            return logger.clone();
        }

        // Root before loggers, the order `update` locks in
        let root = self.root.read();
        self.loggers
            .write()
            .entry(name.to_string())
            .or_insert_with(|| root.with_name(name))
            .clone()
    }

    pub fn root(&self) -> Logger {
        self.root.read().clone()
    }

    /// Replace the root; only loggers registered afterwards derive from it
    pub fn set_root(&self, root: Logger) {
        *self.root.write() = root;
    }

    /// Names of the registered loggers, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Apply `f` to the root and every registered logger
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&Logger) -> Logger,
    {
        let mut root = self.root.write();
        *root = f(&*root);
        for logger in self.loggers.write().values_mut() {
            *logger = f(&*logger);
        }
    }

    pub fn set_level(&self, level: Level) {
        self.update(|logger| logger.with_level(level));
    }

    pub fn set_writer(&self, writer: Arc<dyn Writer>) {
        self.update(|logger| logger.with_shared_writer(Arc::clone(&writer)));
    }

    pub fn set_encoder(&self, encoder: Arc<dyn Encoder>) {
        self.update(|logger| logger.with_shared_encoder(Arc::clone(&encoder)));
    }

    pub fn set_depth(&self, depth: usize) {
        self.update(|logger| logger.with_depth(depth));
    }

    pub fn add_hook(&self, hook: Hook) {
        self.update(|logger| logger.with_hook(Arc::clone(&hook)));
    }

    pub fn add_field(&self, field: Field) {
        self.update(|logger| logger.with_field(field.clone()));
    }

    pub fn add_kv(&self, key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) {
        self.add_field(Field::new(key, value));
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(Logger::default())
    }
}
