//! Protocol Layer: Framing pesan di dalam ring
//!
//! Prinsip desain:
//! - Fixed-size header: 8 bytes, little-endian
//! - Slot selalu aligned 8 bytes
//! - No allocation: Encode/decode langsung ke/dari memory ring

mod encoder;
mod message;

pub use encoder::{Decoder, Encoder};
pub use message::{
    message_align, slot_size, MessageHeader, HEADER_SIZE, MESSAGE_ALIGN, TURN_AROUND,
};
