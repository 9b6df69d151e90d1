//! Core module: Variable-Length Message Ring
//!
//! Prinsip desain:
//! - Zero-Copy: Payload ditulis dan dibaca langsung di memory ring
//! - Lock-Free: Hanya atomic load/store pada dua cursor
//! - No-Allocation: Region dialokasikan sekali saat init

mod cursor;
mod mmap_storage;
mod ring_buffer;
mod storage;

pub use cursor::{AtomicCursor, Cursor, PlainCursor};
pub use mmap_storage::MmapStorage;
pub use ring_buffer::{
    required_bytes, Consumer, LocalRing, Producer, ReadGrant, RingBuffer, SpscRing, WriteGrant,
};
pub use storage::{HeapStorage, RawStorage, Region, Storage};
