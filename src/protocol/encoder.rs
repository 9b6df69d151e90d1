//! Zero-Allocation Payload Encoder/Decoder
//!
//! Encode field langsung ke payload slice yang dipinjam dari ring
//! (zero-copy), dan decode langsung dari payload hasil `pop_begin`.
//! Semua field little-endian. Tidak ada alokasi.

/// Encoder di atas payload slice yang sudah di-reserve
pub struct Encoder<'a> {
    buffer: &'a mut [u8],
    write_pos: usize,
}

impl<'a> Encoder<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            write_pos: 0,
        }
    }

    /// Reset encoder untuk reuse
    #[inline(always)]
    pub fn reset(&mut self) {
        self.write_pos = 0;
    }

    /// Tulis raw bytes. `None` jika sisa buffer tidak cukup.
    #[inline(always)]
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Option<()> {
        let end = self.write_pos.checked_add(bytes.len())?;
        if end > self.buffer.len() {
            return None;
        }
        self.buffer[self.write_pos..end].copy_from_slice(bytes);
        self.write_pos = end;
        Some(())
    }

    #[inline(always)]
    pub fn put_u8(&mut self, v: u8) -> Option<()> {
        self.put_bytes(&[v])
    }

    #[inline(always)]
    pub fn put_u16(&mut self, v: u16) -> Option<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    #[inline(always)]
    pub fn put_u32(&mut self, v: u32) -> Option<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    #[inline(always)]
    pub fn put_u64(&mut self, v: u64) -> Option<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    /// Jumlah bytes yang sudah ditulis
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.write_pos
    }

    /// Sisa ruang di buffer
    #[inline(always)]
    pub fn available(&self) -> usize {
        self.buffer.len() - self.write_pos
    }
}

/// Zero-copy decoder
pub struct Decoder<'a> {
    buffer: &'a [u8],
    read_pos: usize,
}

impl<'a> Decoder<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            read_pos: 0,
        }
    }

    /// Ambil `len` bytes berikutnya (zero-copy)
    #[inline(always)]
    pub fn get_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.read_pos.checked_add(len)?;
        if end > self.buffer.len() {
            return None;
        }
        let bytes = &self.buffer[self.read_pos..end];
        self.read_pos = end;
        Some(bytes)
    }

    #[inline(always)]
    fn get_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Some(out)
    }

    #[inline(always)]
    pub fn get_u8(&mut self) -> Option<u8> {
        self.get_array::<1>().map(|b| b[0])
    }

    #[inline(always)]
    pub fn get_u16(&mut self) -> Option<u16> {
        self.get_array().map(u16::from_le_bytes)
    }

    #[inline(always)]
    pub fn get_u32(&mut self) -> Option<u32> {
        self.get_array().map(u32::from_le_bytes)
    }

    #[inline(always)]
    pub fn get_u64(&mut self) -> Option<u64> {
        self.get_array().map(u64::from_le_bytes)
    }

    /// Remaining bytes
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.read_pos)
    }
}
