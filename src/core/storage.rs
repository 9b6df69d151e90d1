//! Backing storage untuk ring
//!
//! Ring tidak peduli dari mana memory-nya: heap, mmap, shared memory
//! segment, atau region device. Yang dibutuhkan hanya pointer + panjang
//! yang valid selama ring hidup.

use super::mmap_storage::MmapStorage;
use std::ptr::NonNull;

/// Region bytes milik ring.
///
/// # Safety
/// Implementor menjamin `as_mut_ptr()` valid untuk read/write sepanjang
/// `len()` bytes selama `self` hidup, alamatnya tidak berubah walau `self`
/// di-move, dan tidak ada kode lain yang mengakses region tersebut.
pub unsafe trait Storage {
    fn as_mut_ptr(&self) -> *mut u8;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Region di heap, dialokasikan sekali saat init
pub struct HeapStorage {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: HeapStorage memiliki alokasinya sendiri; akses hanya lewat
// raw pointer yang disinkronkan oleh cursor ring.
unsafe impl Send for HeapStorage {}
unsafe impl Sync for HeapStorage {}

impl HeapStorage {
    /// Alokasi `len` bytes, diisi nol
    pub fn zeroed(len: usize) -> Self {
        let boxed: Box<[u8]> = vec![0u8; len].into_boxed_slice();
        let raw = Box::into_raw(boxed) as *mut u8;
        // SAFETY: Box::into_raw tidak pernah null (dangling-aligned untuk len 0)
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        Self { ptr, len }
    }
}

impl Drop for HeapStorage {
    fn drop(&mut self) {
        // SAFETY: ptr/len berasal dari Box<[u8]> di `zeroed`
        unsafe {
            let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
            drop(Box::from_raw(slice));
        }
    }
}

unsafe impl Storage for HeapStorage {
    #[inline(always)]
    fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

/// Region eksternal (shared memory segment, mapping device, dll).
///
/// Tidak memiliki memory-nya; pemilik asli bertanggung jawab atas unmap.
pub struct RawStorage {
    ptr: NonNull<u8>,
    len: usize,
}

unsafe impl Send for RawStorage {}
unsafe impl Sync for RawStorage {}

impl RawStorage {
    /// Bungkus region eksternal.
    ///
    /// # Safety
    /// `ptr` harus valid untuk read/write `len` bytes selama `RawStorage`
    /// (dan ring yang memakainya) hidup, dan tidak boleh diakses pihak lain
    /// selama itu.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }
}

unsafe impl Storage for RawStorage {
    #[inline(always)]
    fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

/// Storage yang dipilih lewat konfigurasi
pub enum Region {
    Heap(HeapStorage),
    Mmap(MmapStorage),
}

unsafe impl Storage for Region {
    #[inline(always)]
    fn as_mut_ptr(&self) -> *mut u8 {
        match self {
            Self::Heap(s) => s.as_mut_ptr(),
            Self::Mmap(s) => s.as_mut_ptr(),
        }
    }

    #[inline(always)]
    fn len(&self) -> usize {
        match self {
            Self::Heap(s) => s.len(),
            Self::Mmap(s) => s.len(),
        }
    }
}
