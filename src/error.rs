//! Error types untuk ring dan konfigurasi

use std::io;

/// Error dari operasi ring.
///
/// `InsufficientSpace`, `Empty` dan `OutputTooSmall` adalah kondisi normal
/// di hot path: tidak ada state yang berubah, caller bebas retry.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    #[error("insufficient space for {requested} byte payload ({slot} byte slot)")]
    InsufficientSpace { requested: usize, slot: usize },

    #[error("ring is empty")]
    Empty,

    #[error("output buffer too small: message has {needed} bytes, buffer holds {available}")]
    OutputTooSmall { needed: usize, available: usize },

    #[error("payload of {len} bytes does not fit the u32 length field")]
    MessageTooLarge { len: usize },

    #[error("message type 0xFFFFFFFF is reserved for the turn-around sentinel")]
    ReservedType,

    #[error("corrupt message header at offset {offset}")]
    Corrupt { offset: usize },

    #[error("ring capacity {capacity} overflows the storage size")]
    CapacityTooLarge { capacity: usize },

    #[error("storage region too small: need {required} bytes, got {actual}")]
    RegionTooSmall { required: usize, actual: usize },

    #[error("storage i/o failed")]
    Io(#[from] io::Error),
}

impl RingError {
    /// `true` untuk kondisi yang hilang sendiri kalau sisi lain maju
    /// (penuh / kosong)
    #[inline(always)]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InsufficientSpace { .. } | Self::Empty)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}
