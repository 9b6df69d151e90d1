//! Cursor: posisi baca/tulis di dalam ring
//!
//! Algoritma ring hanya ditulis sekali, generic di atas [`Cursor`]:
//! - [`PlainCursor`]: integer biasa, ordering diabaikan (single-thread)
//! - [`AtomicCursor`]: `AtomicUsize` dengan acquire/release (SPSC lintas thread)

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Satu cursor (byte offset) di dalam ring.
///
/// Setiap cursor hanya punya SATU penulis: write-cursor milik producer,
/// read-cursor milik consumer.
pub trait Cursor: Default {
    /// `true` jika cursor aman dibagi antar thread
    const CONCURRENT: bool;

    fn load(&self, order: Ordering) -> usize;

    fn store(&self, value: usize, order: Ordering);
}

/// Cursor non-atomic untuk producer dan consumer yang berjalan serial
#[derive(Debug, Default)]
pub struct PlainCursor(Cell<usize>);

impl Cursor for PlainCursor {
    const CONCURRENT: bool = false;

    #[inline(always)]
    fn load(&self, _order: Ordering) -> usize {
        self.0.get()
    }

    #[inline(always)]
    fn store(&self, value: usize, _order: Ordering) {
        self.0.set(value);
    }
}

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
#[derive(Debug)]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Cursor atomic, satu cache line sendiri supaya producer dan consumer
/// tidak false sharing
#[derive(Debug)]
pub struct AtomicCursor(CacheLinePadded<AtomicUsize>);

impl AtomicCursor {
    pub const fn new(value: usize) -> Self {
        Self(CacheLinePadded::new(AtomicUsize::new(value)))
    }
}

impl Default for AtomicCursor {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Cursor for AtomicCursor {
    const CONCURRENT: bool = true;

    #[inline(always)]
    fn load(&self, order: Ordering) -> usize {
        self.0.value.load(order)
    }

    #[inline(always)]
    fn store(&self, value: usize, order: Ordering) {
        self.0.value.store(value, order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_cursor() {
        let c = PlainCursor::default();
        assert_eq!(c.load(Ordering::Acquire), 0);
        c.store(24, Ordering::Release);
        assert_eq!(c.load(Ordering::Relaxed), 24);
    }

    #[test]
    fn test_atomic_cursor_padding() {
        assert_eq!(std::mem::align_of::<AtomicCursor>(), 64);
        assert_eq!(std::mem::size_of::<AtomicCursor>(), 64);

        let c = AtomicCursor::default();
        assert_eq!(c.load(Ordering::Acquire), 0);
        c.store(16, Ordering::Release);
        assert_eq!(c.load(Ordering::Acquire), 16);

        let c = AtomicCursor::new(40);
        assert_eq!(c.load(Ordering::Relaxed), 40);
    }
}
