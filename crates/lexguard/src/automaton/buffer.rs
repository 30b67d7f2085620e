//! Bounded match buffers and the pool that recycles them.
//!
//! A scan writes its raw hits into a [`MatchBuffer`] whose capacity is fixed
//! when the buffer is created, so the matcher never reallocates on the hot
//! path. Buffers are handed out by a [`BufferPool`] wrapped in a
//! [`PooledBuffer`] guard that returns them on drop.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use serde::Serialize;

use super::trie::PatternId;

/// Default number of raw hits a single scan may record.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Largest buffer capacity a configuration may ask for.
pub const MAX_BUFFER_CAPACITY: usize = 1 << 16;

/// Default number of idle buffers a pool keeps around.
pub const DEFAULT_MAX_IDLE_BUFFERS: usize = 64;

/// A single automaton hit: which pattern ended at which code-point position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RawMatch {
    /// Index of the matched pattern.
    pub pattern: PatternId,
    /// Code-point offset of the pattern's last symbol in the scanned text.
    pub end: usize,
}

/// Fixed-capacity, ordered record of the hits produced by one scan.
///
/// Once full, further hits are dropped and the buffer is marked truncated,
/// so only the first `capacity` hits in scan order are kept.
#[derive(Debug, Default)]
pub struct MatchBuffer {
    hits: Vec<RawMatch>,
    capacity: usize,
    truncated: bool,
}

impl MatchBuffer {
    /// Create an empty buffer holding at most `capacity` hits.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
            capacity,
            truncated: false,
        }
    }

    /// Record a hit. Returns `false` (and marks the buffer truncated) when full.
    pub fn push(&mut self, pattern: PatternId, end: usize) -> bool {
        if self.is_full() {
            self.truncated = true;
            return false;
        }
        self.hits.push(RawMatch { pattern, end });
        true
    }

    /// Maximum number of hits this buffer can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the buffer has reached its capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    /// Whether at least one hit was dropped because the buffer was full.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The recorded hits in scan order.
    #[must_use]
    pub fn as_slice(&self) -> &[RawMatch] {
        &self.hits
    }

    /// Reset to zero length, keeping the allocation.
    pub fn clear(&mut self) {
        self.hits.clear();
        self.truncated = false;
    }
}

impl Deref for MatchBuffer {
    type Target = [RawMatch];

    fn deref(&self) -> &Self::Target {
        &self.hits
    }
}

/// A synchronized pool of [`MatchBuffer`]s sharing one capacity.
///
/// The pool is the only mutable state touched while serving, so concurrent
/// scans against one compiled automaton each take their own buffer from it.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<MatchBuffer>>,
    capacity: usize,
    max_idle: usize,
}

impl BufferPool {
    /// Create a pool whose buffers hold `capacity` hits, retaining at most
    /// `max_idle` released buffers.
    #[must_use]
    pub fn new(capacity: usize, max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            capacity,
            max_idle,
        }
    }

    /// Take an idle buffer, or allocate a fresh one if none is idle.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let recycled = self.idle.lock().pop();
        let buffer = recycled.unwrap_or_else(|| MatchBuffer::with_capacity(self.capacity));
        PooledBuffer {
            pool: self,
            buffer,
        }
    }

    /// Capacity of every buffer handed out by this pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers currently waiting to be reused.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buffer: MatchBuffer) {
        buffer.clear();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buffer);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_IDLE_BUFFERS)
    }
}

/// A buffer on loan from a [`BufferPool`]; returned to the pool when dropped.
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buffer: MatchBuffer,
}

impl PooledBuffer<'_> {
    /// Return the buffer to its pool now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = MatchBuffer;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}
