//! Random sampling as a hook
//!
//! A [`Sampler`] decides inside the gate, so a sampled-out record costs no
//! field construction and no lazy evaluation.
//!
//! ```
//! use rust_kvlog::prelude::*;
//!
//! let logger = Logger::new(DiscardWriter)
//!     .with_hook(sample(SamplingConfig::new(0.1).with_logger_rate("db", 0.01)));
//! ```

use super::hook::Hook;
use super::level::Level;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Throttling applied when a logger gets busier than `per_second`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adaptive {
    pub per_second: u64,
    /// The throttled rate never drops below this
    pub floor: f64,
}

#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Fraction of records kept, 0.0 to 1.0
    pub rate: f64,
    /// Records at or above this level are always kept
    pub always_at: Level,
    /// Rates replacing `rate` for the named loggers
    pub logger_rates: HashMap<String, f64>,
    pub adaptive: Option<Adaptive>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            always_at: Level::ERROR,
            logger_rates: HashMap::new(),
            adaptive: None,
        }
    }
}

impl SamplingConfig {
    /// Keep `rate` of the records; the rate is clamped to 0.0..=1.0
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_always_at(mut self, level: Level) -> Self {
        self.always_at = level;
        self
    }

    #[must_use]
    pub fn with_logger_rate(mut self, logger: impl Into<String>, rate: f64) -> Self {
        self.logger_rates.insert(logger.into(), rate.clamp(0.0, 1.0));
        self
    }

    /// Scale the rate down while more than `per_second` records arrive
    #[must_use]
    pub fn with_adaptive(mut self, per_second: u64, floor: f64) -> Self {
        self.adaptive = Some(Adaptive {
            per_second,
            floor: floor.clamp(0.0, 1.0),
        });
        self
    }
}

#[derive(Debug, Default)]
pub struct SamplerMetrics {
    kept: AtomicU64,
    dropped: AtomicU64,
}

impl SamplerMetrics {
    pub fn kept(&self) -> u64 {
        self.kept.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn seen(&self) -> u64 {
        self.kept() + self.dropped()
    }

    /// Kept over seen; 1.0 before the first record
    pub fn keep_ratio(&self) -> f64 {
        match self.seen() {
            0 => 1.0,
            seen => self.kept() as f64 / seen as f64,
        }
    }

    pub fn reset(&self) {
        self.kept.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }

    fn count(&self, keep: bool) {
        let counter = if keep { &self.kept } else { &self.dropped };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Arrivals in the current one-second window and the rate of the last one
#[derive(Debug)]
struct Window {
    started: Instant,
    arrivals: u64,
    last_rate: u64,
}

impl Window {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            arrivals: 0,
            last_rate: 0,
        }
    }

    /// Count one arrival and return the busier of the closed and open windows
    fn arrive(&mut self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= WINDOW {
            self.last_rate = if elapsed >= 2 * WINDOW { 0 } else { self.arrivals };
            self.started = now;
            self.arrivals = 0;
        }
        self.arrivals += 1;
        self.last_rate.max(self.arrivals)
    }
}

#[derive(Debug)]
pub struct Sampler {
    config: SamplingConfig,
    metrics: SamplerMetrics,
    window: Mutex<Window>,
}

impl Sampler {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            metrics: SamplerMetrics::default(),
            window: Mutex::new(Window::new()),
        }
    }

    /// Whether a record of logger `name` at `level` is kept
    pub fn keep(&self, name: &str, level: Level) -> bool {
        let keep = level >= self.config.always_at || {
            let rate = self.rate_for(name);
            rate >= 1.0 || (rate > 0.0 && rand::thread_rng().gen::<f64>() < rate)
        };
        self.metrics.count(keep);
        keep
    }

    /// The rate applied to the next record of logger `name`
    fn rate_for(&self, name: &str) -> f64 {
        if let Some(&rate) = self.config.logger_rates.get(name) {
            return rate;
        }
        match self.config.adaptive {
            Some(adaptive) => {
                let busy = self.window.lock().arrive(Instant::now());
                if busy > adaptive.per_second {
                    let scale = adaptive.per_second as f64 / busy as f64;
                    (self.config.rate * scale).max(adaptive.floor)
                } else {
                    self.config.rate
                }
            }
            None => self.config.rate,
        }
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }
}

/// A hook sampling with a sampler of its own
pub fn sample(config: SamplingConfig) -> Hook {
    sampler_hook(Arc::new(Sampler::new(config)))
}

/// A hook backed by a shared sampler whose metrics stay readable
pub fn sampler_hook(sampler: Arc<Sampler>) -> Hook {
    Arc::new(move |name, level| sampler.keep(name, level))
}
