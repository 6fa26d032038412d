//! Scratch-buffer pools with scoped leases
//!
//! Per-worker accumulators and per-object pixel buffers are drawn from
//! process-wide pools keyed by element type. A [`PooledBuffer`] lease
//! returns its buffer when dropped, including on the error path, so a
//! request can never leak or double-release a pool slot.
//!
//! Cleared pools guarantee zero-filled buffers. A lease from a cleared pool
//! restores the zero state on release; if the holder declared how much of
//! the buffer it touched ([`PooledBuffer::set_used_len`]), only that prefix
//! is refilled.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

/// Initial number of elements of a pooled buffer
pub const BUFFER_SIZE: usize = 65536;

const MAX_RETAINED_BUFFERS: usize = 64;
const MAX_RETAINED_LEN: usize = BUFFER_SIZE * 64;

static CLEARED_I32_BUFFERS: ScratchPool<i32> = ScratchPool::new(true);
static CLEARED_F64_BUFFERS: ScratchPool<f64> = ScratchPool::new(true);

/// Pool of zero-filled `i32` buffers (counters, list heads)
pub fn cleared_i32_pool() -> &'static ScratchPool<i32> {
    &CLEARED_I32_BUFFERS
}

/// Pool of zero-filled `f64` buffers (sums)
pub fn cleared_f64_pool() -> &'static ScratchPool<f64> {
    &CLEARED_F64_BUFFERS
}

/// A pool of reusable buffers of one element type
pub struct ScratchPool<T: Copy + Default + 'static> {
    free: Mutex<Vec<Vec<T>>>,
    cleared: bool,
}

impl<T: Copy + Default + 'static> ScratchPool<T> {
    /// Create an empty pool
    ///
    /// # Arguments
    ///
    /// * `cleared` - Whether leased buffers are guaranteed to be zero-filled
    pub const fn new(cleared: bool) -> Self {
        Self {
            free: parking_lot::const_mutex(Vec::new()),
            cleared,
        }
    }

    /// Lease a buffer of at least [`BUFFER_SIZE`] elements
    pub fn acquire(&self) -> PooledBuffer<'_, T> {
        let buffer = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| vec![T::default(); BUFFER_SIZE]);
        PooledBuffer {
            pool: self,
            buffer,
            used_len: None,
        }
    }

    /// Lease `count` buffers at once
    pub fn acquire_many(&self, count: usize) -> Vec<PooledBuffer<'_, T>> {
        (0..count).map(|_| self.acquire()).collect()
    }

    /// Whether leased buffers are zero-filled
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Number of idle buffers currently kept by the pool
    pub fn retained(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, mut buffer: Vec<T>, used_len: Option<usize>) {
        if buffer.len() > MAX_RETAINED_LEN {
            return;
        }
        if self.cleared {
            let len = used_len.map_or(buffer.len(), |used| used.min(buffer.len()));
            buffer[..len].fill(T::default());
        }
        let mut free = self.free.lock();
        if free.len() < MAX_RETAINED_BUFFERS {
            free.push(buffer);
        }
    }
}

/// A leased buffer, returned to its pool on drop
pub struct PooledBuffer<'a, T: Copy + Default + 'static> {
    pool: &'a ScratchPool<T>,
    buffer: Vec<T>,
    used_len: Option<usize>,
}

impl<T: Copy + Default + 'static> PooledBuffer<'_, T> {
    /// Declare that only the first `len` elements were modified
    pub fn set_used_len(&mut self, len: usize) {
        self.used_len = Some(len);
    }
}

impl<T: Copy + Default + 'static> Deref for PooledBuffer<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.buffer
    }
}

impl<T: Copy + Default + 'static> DerefMut for PooledBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buffer
    }
}

impl<T: Copy + Default + 'static> Drop for PooledBuffer<'_, T> {
    fn drop(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        self.pool.release(buffer, self.used_len);
    }
}
