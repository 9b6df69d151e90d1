//! Memory-Mapped Storage untuk ring
//!
//! Region ring di-mmap langsung ke virtual memory:
//! - Anonymous: page dari kernel, tanpa file
//! - File-backed: proses lain bisa map file yang sama
//!
//! Isi file TIDAK dijamin bisa dipulihkan setelah crash; cursor ring
//! hidup di luar region.

use super::storage::Storage;
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Mmap-backed region
pub struct MmapStorage {
    mmap: MmapMut,
    // Alamat mapping stabil walau `MmapMut` di-move
    ptr: *mut u8,
    len: usize,
}

// SAFETY: MmapMut sendiri Send + Sync; `ptr` menunjuk ke mapping yang sama
unsafe impl Send for MmapStorage {}
unsafe impl Sync for MmapStorage {}

impl MmapStorage {
    /// Mapping anonymous sebesar `len` bytes
    pub fn anonymous(len: usize) -> io::Result<Self> {
        let mut mmap = MmapOptions::new().len(len).map_anon()?;
        let ptr = mmap.as_mut_ptr();
        debug!(len, "mapped anonymous ring region");
        Ok(Self { mmap, ptr, len })
    }

    /// Membuat atau membuka file lalu map `len` bytes pertama
    ///
    /// # Arguments
    /// * `path` - Path ke file region
    /// * `len` - Ukuran region dalam bytes
    pub fn open<P: AsRef<Path>>(path: P, len: usize) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.set_len(len as u64)?;

        // SAFETY: File dibuka read/write; ring adalah satu-satunya pengakses
        // mapping ini di proses ini
        let mut mmap = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        let ptr = mmap.as_mut_ptr();

        info!(path = %path.display(), len, "mapped file-backed ring region");
        Ok(Self { mmap, ptr, len })
    }

    /// Pin page region ke RAM (mlock) supaya hot path tidak kena page fault
    #[cfg(unix)]
    pub fn lock(&self) -> io::Result<()> {
        // SAFETY: range [ptr, ptr+len) adalah mapping milik kita
        let rc = unsafe { libc::mlock(self.ptr as *const libc::c_void, self.len) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(len = self.len, "locked ring region pages");
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn lock(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "page locking requires unix",
        ))
    }

    /// Flush perubahan ke file (no-op untuk mapping anonymous)
    pub fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }
}

unsafe impl Storage for MmapStorage {
    #[inline(always)]
    fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_mmap_anonymous() {
        let storage = MmapStorage::anonymous(4096).unwrap();
        assert_eq!(storage.len(), 4096);

        unsafe {
            storage.as_mut_ptr().write(42);
            assert_eq!(storage.as_mut_ptr().read(), 42);
        }
    }

    #[test]
    fn test_mmap_file_shared_view() {
        let path = temp_path("vlmring_storage.dat");

        {
            let storage = MmapStorage::open(&path, 4096).unwrap();
            let data = b"Hello, ring!";
            unsafe {
                std::ptr::copy_nonoverlapping(data.as_ptr(), storage.as_mut_ptr(), data.len());
            }
            storage.flush().unwrap();
        }

        // File berisi bytes yang ditulis lewat mapping
        let content = fs::read(&path).unwrap();
        assert_eq!(content.len(), 4096);
        assert_eq!(&content[..12], b"Hello, ring!");

        fs::remove_file(&path).ok();
    }
}
