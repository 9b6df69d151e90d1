//! Konfigurasi ring dari file TOML
//!
//! ```toml
//! capacity = 65536
//! log_level = "debug"
//! lock_pages = true
//!
//! [backing]
//! kind = "file"
//! path = "/dev/shm/vlmring"
//! ```

use crate::core::{
    required_bytes, Cursor, HeapStorage, LocalRing, MmapStorage, Region, RingBuffer, SpscRing,
};
use crate::error::{ConfigError, RingError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Deserialize, Debug, Clone)]
pub struct RingConfig {
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default)]
    pub backing: Backing,
    /// mlock region (hanya untuk backing mmap)
    #[serde(default)]
    pub lock_pages: bool,
}

/// Sumber memory ring
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backing {
    #[default]
    Heap,
    Anonymous,
    File {
        path: PathBuf,
    },
}

mod defaults {
    pub fn capacity() -> usize {
        1 << 16 // 65536
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::capacity(),
            log_level: defaults::log_level(),
            backing: Backing::default(),
            lock_pages: false,
        }
    }
}

impl RingConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Alokasi / map region sesuai `backing`
    ///
    /// # Errors
    /// [`RingError::CapacityTooLarge`] jika `capacity` overflow ukuran
    /// storage, [`RingError::Io`] jika mmap atau mlock gagal.
    pub fn build_region(&self) -> Result<Region, RingError> {
        let len = required_bytes(self.capacity).ok_or(RingError::CapacityTooLarge {
            capacity: self.capacity,
        })?;
        let region = match &self.backing {
            Backing::Heap => {
                if self.lock_pages {
                    warn!("lock_pages ignored for heap backing");
                }
                return Ok(Region::Heap(HeapStorage::zeroed(len)));
            }
            Backing::Anonymous => MmapStorage::anonymous(len)?,
            Backing::File { path } => MmapStorage::open(path, len)?,
        };
        if self.lock_pages {
            region.lock()?;
        }
        Ok(Region::Mmap(region))
    }

    pub fn build<C: Cursor>(&self) -> Result<RingBuffer<C, Region>, RingError> {
        RingBuffer::with_storage(self.build_region()?, self.capacity)
    }

    /// Ring untuk producer dan consumer di thread berbeda
    pub fn build_spsc(&self) -> Result<SpscRing<Region>, RingError> {
        self.build()
    }

    /// Ring untuk producer dan consumer di thread yang sama
    pub fn build_local(&self) -> Result<LocalRing<Region>, RingError> {
        self.build()
    }
}
