//! Pooled storage for the emission pipeline
//!
//! Field lists and encoder scratch buffers are recycled through bounded,
//! lock-free free lists (`crossbeam_channel` bounded channels used as MPMC
//! queues). Acquisition and release never block and never fail: an empty
//! free list means a fresh allocation, a full one means the released buffer
//! is dropped.
//!
//! Field buffers are segregated by capacity class so that a record with two
//! fields does not pin a 32-slot buffer and a record with twenty does not
//! regrow a 4-slot one on every emission.

use super::field::{Field, FieldValue};
use super::metrics::PoolMetrics;
use crossbeam_channel::{bounded, Receiver, Sender};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::fmt;
use std::mem;

/// Capacity classes of pooled field buffers, smallest first
pub const FIELD_CLASSES: [usize; 4] = [4, 8, 16, 32];

/// Field buffers that grew beyond this many slots are not retained
pub const MAX_RETAINED_FIELDS: usize = 256;

/// Default scratch buffer capacity in bytes
pub const SCRATCH_CAPACITY: usize = 1024;

/// Scratch buffers that grew beyond this many bytes are not retained
pub const MAX_RETAINED_SCRATCH: usize = 64 * 1024;

const DEFAULT_SLOTS: usize = 256;

struct FreeList<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> FreeList<T> {
    fn new(slots: usize) -> Self {
        let (tx, rx) = bounded(slots);
        Self { tx, rx }
    }

    #[inline]
    fn take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Returns false when the list is full and the item was dropped
    #[inline]
    fn put(&self, item: T) -> bool {
        self.tx.try_send(item).is_ok()
    }

    fn len(&self) -> usize {
        self.rx.len()
    }
}

/// Recycles `Vec<Field>` storage between emissions
pub struct FieldPool {
    classes: [FreeList<Vec<Field>>; 4],
    metrics: PoolMetrics,
}

impl FieldPool {
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_SLOTS)
    }

    /// Create a pool retaining at most `slots` idle buffers per class
    pub fn with_slots(slots: usize) -> Self {
        Self {
            classes: [
                FreeList::new(slots),
                FreeList::new(slots),
                FreeList::new(slots),
                FreeList::new(slots),
            ],
            metrics: PoolMetrics::new(),
        }
    }

    /// Take an empty buffer able to hold at least `hint` fields without growing
    pub fn acquire(&self, hint: usize) -> FieldBuffer<'_> {
        let fields = match FIELD_CLASSES.iter().position(|&class| class >= hint) {
            Some(index) => match self.classes[index].take() {
                Some(fields) => {
                    self.metrics.record_reused();
                    fields
                }
                None => {
                    self.metrics.record_fresh();
                    Vec::with_capacity(FIELD_CLASSES[index])
                }
            },
            None => {
                self.metrics.record_fresh();
                Vec::with_capacity(hint)
            }
        };
        debug_assert!(fields.is_empty());
        FieldBuffer { pool: self, fields }
    }

    /// Give a buffer back; equivalent to dropping it
    pub fn release(&self, buffer: FieldBuffer<'_>) {
        drop(buffer);
    }

    fn recycle(&self, mut fields: Vec<Field>) {
        fields.clear();
        let capacity = fields.capacity();
        let class = FIELD_CLASSES.iter().rposition(|&class| class <= capacity);
        match class {
            Some(index) if capacity <= MAX_RETAINED_FIELDS => {
                if self.classes[index].put(fields) {
                    self.metrics.record_returned();
                } else {
                    self.metrics.record_discarded();
                }
            }
            _ => self.metrics.record_discarded(),
        }
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Idle buffers currently held, over all classes
    pub fn idle(&self) -> usize {
        self.classes.iter().map(FreeList::len).sum()
    }
}

impl Default for FieldPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPool")
            .field("idle", &self.idle())
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// An ordered field list borrowed from a [`FieldPool`]
///
/// The storage goes back to its pool when the buffer is dropped, so nothing
/// borrowed from it can outlive the emission that acquired it.
pub struct FieldBuffer<'p> {
    pool: &'p FieldPool,
    fields: Vec<Field>,
}

impl FieldBuffer<'_> {
    #[inline]
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Append a key-value pair, builder style
    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(Field::new(key, value));
        self
    }

    #[inline]
    pub fn as_slice(&self) -> &[Field] {
        &self.fields
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.fields.capacity()
    }

    /// Remove all fields, keeping the storage
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Copy the fields out; the buffer itself still goes back to the pool
    pub fn to_vec(&self) -> Vec<Field> {
        self.fields.clone()
    }
}

impl Extend<Field> for FieldBuffer<'_> {
    fn extend<I: IntoIterator<Item = Field>>(&mut self, iter: I) {
        self.fields.extend(iter);
    }
}

impl<'a> Extend<&'a Field> for FieldBuffer<'_> {
    fn extend<I: IntoIterator<Item = &'a Field>>(&mut self, iter: I) {
        self.fields.extend(iter.into_iter().cloned());
    }
}

impl Drop for FieldBuffer<'_> {
    fn drop(&mut self) {
        self.pool.recycle(mem::take(&mut self.fields));
    }
}

impl fmt::Debug for FieldBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}

/// Recycles encoder scratch buffers
pub struct BufferPool {
    free: FreeList<Vec<u8>>,
    capacity: usize,
    metrics: PoolMetrics,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SLOTS, SCRATCH_CAPACITY)
    }

    /// Create a pool of at most `slots` idle buffers, each allocated with `capacity` bytes
    pub fn with_capacity(slots: usize, capacity: usize) -> Self {
        Self {
            free: FreeList::new(slots),
            capacity,
            metrics: PoolMetrics::new(),
        }
    }

    pub fn acquire(&self) -> ScratchBuffer<'_> {
        let bytes = match self.free.take() {
            Some(bytes) => {
                self.metrics.record_reused();
                bytes
            }
            None => {
                self.metrics.record_fresh();
                Vec::with_capacity(self.capacity)
            }
        };
        ScratchBuffer { pool: self, bytes }
    }

    pub fn release(&self, buffer: ScratchBuffer<'_>) {
        drop(buffer);
    }

    fn recycle(&self, mut bytes: Vec<u8>) {
        bytes.clear();
        if bytes.capacity() > MAX_RETAINED_SCRATCH || !self.free.put(bytes) {
            self.metrics.record_discarded();
        } else {
            self.metrics.record_returned();
        }
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    pub fn idle(&self) -> usize {
        self.free.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle())
            .field("capacity", &self.capacity)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// A byte buffer borrowed from a [`BufferPool`], returned on drop
pub struct ScratchBuffer<'p> {
    pool: &'p BufferPool,
    bytes: Vec<u8>,
}

impl ScratchBuffer<'_> {
    #[inline]
    pub fn as_mut_vec(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for ScratchBuffer<'_> {
    fn drop(&mut self) {
        self.pool.recycle(mem::take(&mut self.bytes));
    }
}

/// The pools one logger draws from
#[derive(Debug, Default)]
pub struct Pools {
    pub fields: FieldPool,
    pub buffers: BufferPool,
}

static GLOBAL_POOLS: Lazy<Pools> = Lazy::new(Pools::new);

impl Pools {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide pools used by loggers unless told otherwise
    pub fn global() -> &'static Pools {
        &GLOBAL_POOLS
    }

    /// A private set of pools with the lifetime of the process
    ///
    /// Each call leaks one small allocation; meant for tests and benchmarks
    /// that need pool counters nobody else touches.
    pub fn leaked() -> &'static Pools {
        Box::leak(Box::new(Pools::new()))
    }
}
