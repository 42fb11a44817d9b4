//! Monotonic ID counters.
//!
//! One generator per ID domain. A connection owns two (callback IDs and
//! deferred IDs); the provider owns one for connection IDs. Domains never
//! share a counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free monotonic `u64` counter. The first ID handed out is 1.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Take the next ID. Safe to call from many tasks at once.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
