//! vlmring - Variable-Length Message Ring
//!
//! Arsitektur:
//! - Zero-Copy: Pesan dibangun dan dibaca langsung di memory ring
//! - Lock-Free: SPSC dengan dua cursor atomic (acquire/release)
//! - No-Allocation: Region dialokasikan sekali (heap, mmap, shared memory)
//! - Binary Framing: Header 8 bytes, slot aligned 8 bytes
//!
//! ```
//! use vlmring::core::SpscRing;
//!
//! let mut ring: SpscRing = SpscRing::new(1024);
//! let (mut tx, mut rx) = ring.split();
//!
//! tx.push(1, b"hello").unwrap();
//! let mut out = [0u8; 16];
//! let header = rx.pop(&mut out).unwrap();
//! assert_eq!(&out[..header.length as usize], b"hello");
//! ```
//!
//! Non-blocking: ring penuh atau kosong langsung dikembalikan sebagai error,
//! retry (spin, yield, sleep) urusan caller.

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;

pub use config::{Backing, RingConfig};
pub use error::{ConfigError, RingError};
