//! Logger and pool metrics for observability
//!
//! Counters are relaxed atomics: they are exact once the counted operations
//! have completed, but no ordering with other memory is implied.

use std::sync::atomic::{AtomicU64, Ordering};

/// Emission counters shared by a logger and everything derived from it
///
/// # Example
///
/// ```
/// use rust_kvlog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_delivered();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.delivered(), 1);
/// assert_eq!(metrics.write_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records written to the sink
    delivered: AtomicU64,

    /// Records rejected by the level or a hook
    filtered: AtomicU64,

    /// Records the encoder turned into zero bytes
    suppressed: AtomicU64,

    /// Writes that returned an error
    write_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_suppressed(&self) -> u64 {
        self.suppressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed writes as a percentage of attempted writes (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been written yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.delivered.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.suppressed.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            delivered: AtomicU64::new(self.delivered()),
            filtered: AtomicU64::new(self.filtered()),
            suppressed: AtomicU64::new(self.suppressed()),
            write_failures: AtomicU64::new(self.write_failures()),
        }
    }
}

/// Traffic counters of a [`FieldPool`](super::pool::FieldPool) or
/// [`BufferPool`](super::pool::BufferPool)
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Buffers created because no pooled one was available
    fresh: AtomicU64,

    /// Buffers handed out from a free list
    reused: AtomicU64,

    /// Buffers filed back into a free list
    returned: AtomicU64,

    /// Released buffers dropped (oversized or free list full)
    discarded: AtomicU64,
}

impl PoolMetrics {
    pub const fn new() -> Self {
        Self {
            fresh: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            returned: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn fresh_allocations(&self) -> u64 {
        self.fresh.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reused(&self) -> u64 {
        self.reused.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn returned(&self) -> u64 {
        self.returned.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Acquisitions of any kind
    pub fn acquired(&self) -> u64 {
        self.fresh_allocations() + self.reused()
    }

    /// Releases of any kind
    pub fn released(&self) -> u64 {
        self.returned() + self.discarded()
    }

    #[inline]
    pub(crate) fn record_fresh(&self) {
        self.fresh.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_reused(&self) {
        self.reused.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_returned(&self) {
        self.returned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }
}
