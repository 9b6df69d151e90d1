//! Variable-Length Message Ring (SPSC)
//!
//! Satu byte buffer berkapasitas tetap, dibagi antara tepat SATU producer
//! dan SATU consumer. Pesan berukuran variabel, di-frame dengan
//! [`MessageHeader`], selalu kontigu di memory (tidak pernah terpotong di
//! ujung buffer).
//!
//! Algoritma push (`w` = write-cursor, `r` = read-cursor):
//!
//! ```text
//! w >= r:  |---r=====w------rest-------|   rest = capacity - w
//!          rest >= slot  -> tulis di [w, w+slot)
//!          r > slot      -> sentinel di w, tulis di [0, slot)
//!
//! w < r:   |=====w------rest-------r===|   rest = r - w
//!          rest > slot   -> tulis di [w, w+slot)
//! ```
//!
//! Perbandingan dengan `r` selalu strict: kalau `w` boleh menyusul tepat ke
//! `r`, kondisi penuh tidak bisa dibedakan dari kosong.
//!
//! Sentinel turn-around ([`TURN_AROUND`]) memberitahu consumer untuk lompat
//! ke offset 0. Karena `w <= capacity`, storage selalu punya ruang satu
//! header ekstra setelah `capacity` untuk sentinel.
//!
//! Memory ordering (varian [`SpscRing`]):
//! - Producer menulis bytes pesan lalu store write-cursor dengan `Release`;
//!   consumer load write-cursor dengan `Acquire` sebelum membaca bytes.
//! - Consumer selesai membaca lalu store read-cursor dengan `Release`;
//!   producer load read-cursor dengan `Acquire` sebelum memakai ulang ruang.

use super::cursor::{AtomicCursor, Cursor, PlainCursor};
use super::storage::{HeapStorage, Storage};
use crate::error::RingError;
use crate::protocol::{MessageHeader, HEADER_SIZE, MESSAGE_ALIGN, TURN_AROUND};
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

/// Ring dengan cursor atomic, untuk producer dan consumer di thread berbeda
pub type SpscRing<S = HeapStorage> = RingBuffer<AtomicCursor, S>;

/// Ring dengan cursor biasa, untuk producer dan consumer yang berjalan serial
/// (satu thread, atau dilindungi dari luar)
pub type LocalRing<S = HeapStorage> = RingBuffer<PlainCursor, S>;

/// Ukuran storage minimum untuk ring berkapasitas `capacity`, yaitu
/// `align(capacity + 8)`. `None` kalau hasilnya tidak muat di `usize`.
#[inline(always)]
pub const fn required_bytes(capacity: usize) -> Option<usize> {
    match capacity.checked_add(HEADER_SIZE + MESSAGE_ALIGN - 1) {
        Some(n) => Some(n & !(MESSAGE_ALIGN - 1)),
        None => None,
    }
}

/// Slot untuk payload `len` bytes, `None` kalau overflow
#[inline(always)]
fn checked_slot_size(len: usize) -> Option<usize> {
    len.checked_add(HEADER_SIZE + MESSAGE_ALIGN - 1)
        .map(|n| n & !(MESSAGE_ALIGN - 1))
}

/// Variable-length message ring
///
/// Dimiliki oleh komponen yang membuatnya. Producer dan consumer hanya
/// memegang view ([`Producer`], [`Consumer`]) dari [`RingBuffer::split`].
pub struct RingBuffer<C: Cursor, S: Storage = HeapStorage> {
    // Producer side
    write: C,
    // Consumer side
    read: C,
    capacity: usize,
    storage: S,
}

impl<C: Cursor> RingBuffer<C, HeapStorage> {
    /// Membuat ring baru di heap.
    ///
    /// Alokasi hanya terjadi sekali di sini, sebesar
    /// [`required_bytes`]`(capacity)`.
    ///
    /// # Panics
    /// Panic jika `required_bytes(capacity)` overflow. Pakai
    /// [`RingBuffer::with_storage`] untuk kapasitas dari input luar.
    pub fn new(capacity: usize) -> Self {
        let len = match required_bytes(capacity) {
            Some(len) => len,
            None => panic!("ring capacity {} overflows usize", capacity),
        };
        Self::from_parts(HeapStorage::zeroed(len), capacity)
    }
}

impl<C: Cursor, S: Storage> RingBuffer<C, S> {
    /// Membuat ring di atas storage yang sudah ada (mmap, shared memory, ...)
    ///
    /// # Errors
    /// - [`RingError::CapacityTooLarge`] jika `required_bytes(capacity)`
    ///   overflow.
    /// - [`RingError::RegionTooSmall`] jika storage lebih kecil dari
    ///   [`required_bytes`]`(capacity)`.
    pub fn with_storage(storage: S, capacity: usize) -> Result<Self, RingError> {
        let required = required_bytes(capacity).ok_or(RingError::CapacityTooLarge { capacity })?;
        if storage.len() < required {
            return Err(RingError::RegionTooSmall {
                required,
                actual: storage.len(),
            });
        }
        Ok(Self::from_parts(storage, capacity))
    }

    fn from_parts(storage: S, capacity: usize) -> Self {
        debug!(
            capacity,
            storage_len = storage.len(),
            concurrent = C::CONCURRENT,
            "ring created"
        );
        Self {
            write: C::default(),
            read: C::default(),
            capacity,
            storage,
        }
    }

    /// Pisahkan ring menjadi satu producer dan satu consumer.
    ///
    /// Selama view masih hidup, ring dipinjam secara eksklusif; tidak mungkin
    /// ada producer atau consumer kedua.
    pub fn split(&mut self) -> (Producer<'_, C, S>, Consumer<'_, C, S>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Kosongkan ring. Pesan yang belum dibaca hilang.
    pub fn reset(&mut self) {
        self.write.store(0, Ordering::Relaxed);
        self.read.store(0, Ordering::Relaxed);
        debug!(capacity = self.capacity, "ring reset");
    }

    /// Kapasitas yang diminta saat konstruksi
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn storage_len(&self) -> usize {
        self.storage.len()
    }

    #[inline(always)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Cek apakah ring kosong (acquire)
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.is_empty_with(Ordering::Acquire)
    }

    /// Cek apakah ring kosong dengan ordering pilihan caller.
    ///
    /// Query ini hanya load: `Release` dan `AcqRel` diperlakukan sebagai
    /// `Acquire`.
    #[inline(always)]
    pub fn is_empty_with(&self, order: Ordering) -> bool {
        let order = match order {
            Ordering::Release | Ordering::AcqRel => Ordering::Acquire,
            other => other,
        };
        self.write.load(order) == self.read.load(order)
    }

    #[inline(always)]
    pub fn write_cursor(&self) -> usize {
        self.write.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn read_cursor(&self) -> usize {
        self.read.load(Ordering::Relaxed)
    }

    /// # Safety
    /// `[offset, offset+len)` harus di dalam storage dan tidak sedang
    /// ditulis sisi lain.
    #[inline(always)]
    unsafe fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset + len <= self.storage.len());
        std::slice::from_raw_parts(self.storage.as_mut_ptr().add(offset), len)
    }

    /// # Safety
    /// `[offset, offset+len)` harus di dalam storage, milik pemanggil
    /// (producer), dan tidak ada referensi lain ke range tersebut.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    unsafe fn bytes_mut(&self, offset: usize, len: usize) -> &mut [u8] {
        debug_assert!(offset + len <= self.storage.len());
        std::slice::from_raw_parts_mut(self.storage.as_mut_ptr().add(offset), len)
    }

    /// # Safety
    /// Sama seperti [`Self::bytes`] untuk `HEADER_SIZE` bytes di `offset`.
    #[inline(always)]
    unsafe fn header_at(&self, offset: usize) -> MessageHeader {
        debug_assert!(offset + HEADER_SIZE <= self.storage.len());
        let ptr = self.storage.as_mut_ptr().add(offset) as *const [u8; HEADER_SIZE];
        // [u8; N] alignment 1, read tanpa syarat alignment
        MessageHeader::decode_array(&*ptr)
    }
}

/// View sisi producer. Hanya satu per ring.
pub struct Producer<'a, C: Cursor, S: Storage> {
    ring: &'a RingBuffer<C, S>,
}

impl<'a, C: Cursor, S: Storage> Producer<'a, C, S> {
    #[inline(always)]
    pub fn ring(&self) -> &'a RingBuffer<C, S> {
        self.ring
    }

    /// Reserve slot untuk payload `len` bytes (push-begin).
    ///
    /// Region dikembalikan sebagai [`WriteGrant`]; isi payload lewat grant
    /// lalu [`WriteGrant::commit`] untuk publish. Kalau grant di-drop tanpa
    /// commit, tidak ada yang dipublish.
    ///
    /// # Errors
    /// - [`RingError::InsufficientSpace`] jika tidak ada ruang kontigu,
    ///   baik di ekor maupun di kepala buffer. Tidak ada state yang berubah.
    /// - [`RingError::MessageTooLarge`] jika `len` tidak muat di `u32`.
    #[inline(always)]
    pub fn push_begin(&mut self, len: usize) -> Result<WriteGrant<'_, C, S>, RingError> {
        let reserved = u32::try_from(len).map_err(|_| RingError::MessageTooLarge { len })?;
        let slot = checked_slot_size(len).ok_or(RingError::MessageTooLarge { len })?;

        let ring = self.ring;
        let w = ring.write.load(Ordering::Relaxed);
        let r = ring.read.load(Ordering::Acquire);

        let offset = if w >= r {
            let rest = ring.capacity - w;
            if rest >= slot {
                w
            } else if r > slot {
                // SAFETY: w <= capacity, storage >= capacity + HEADER_SIZE,
                // dan [w, w+HEADER_SIZE) belum dipublish ke consumer
                unsafe {
                    MessageHeader::turn_around().write_to(ring.bytes_mut(w, HEADER_SIZE));
                }
                trace!(at = w, slot, "turn-around to head");
                0
            } else {
                return Err(RingError::InsufficientSpace {
                    requested: len,
                    slot,
                });
            }
        } else if r - w > slot {
            w
        } else {
            return Err(RingError::InsufficientSpace {
                requested: len,
                slot,
            });
        };

        Ok(WriteGrant {
            ring,
            offset,
            reserved,
            header: MessageHeader::new(0, reserved),
        })
    }

    /// Copy `data` sebagai satu pesan bertipe `msg_type`
    ///
    /// # Errors
    /// Sama seperti [`Self::push_begin`], plus [`RingError::ReservedType`]
    /// untuk `msg_type == TURN_AROUND`. Gagal berarti tidak ada side effect.
    #[inline(always)]
    pub fn push(&mut self, msg_type: u32, data: &[u8]) -> Result<(), RingError> {
        self.push_with(msg_type, data.len(), |payload| payload.copy_from_slice(data))
    }

    /// Reserve `len` bytes, isi payload lewat `fill` (zero-copy), lalu publish
    #[inline(always)]
    pub fn push_with<F>(&mut self, msg_type: u32, len: usize, fill: F) -> Result<(), RingError>
    where
        F: FnOnce(&mut [u8]),
    {
        if msg_type == TURN_AROUND {
            return Err(RingError::ReservedType);
        }
        let mut grant = self.push_begin(len)?;
        grant.set_type(msg_type);
        fill(grant.payload_mut());
        grant.commit();
        Ok(())
    }
}

/// Slot yang sudah di-reserve producer, belum dipublish
pub struct WriteGrant<'p, C: Cursor, S: Storage> {
    ring: &'p RingBuffer<C, S>,
    offset: usize,
    reserved: u32,
    header: MessageHeader,
}

impl<'p, C: Cursor, S: Storage> WriteGrant<'p, C, S> {
    /// Offset header di dalam buffer
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Panjang payload yang di-reserve
    #[inline(always)]
    pub fn reserved(&self) -> usize {
        self.reserved as usize
    }

    #[inline(always)]
    pub fn header(&self) -> MessageHeader {
        self.header
    }

    /// # Panics
    /// Panic untuk [`TURN_AROUND`]: consumer akan salah membaca pesan ini
    /// sebagai sentinel.
    #[inline(always)]
    pub fn set_type(&mut self, msg_type: u32) {
        assert_ne!(msg_type, TURN_AROUND, "turn-around type is reserved");
        self.header.msg_type = msg_type;
    }

    /// Perkecil panjang payload yang akan dipublish
    ///
    /// # Panics
    /// Panic jika `len` melebihi panjang yang di-reserve.
    #[inline(always)]
    pub fn set_length(&mut self, len: usize) {
        assert!(
            len <= self.reserved as usize,
            "length {} exceeds reserved {}",
            len,
            self.reserved
        );
        self.header.length = len as u32;
    }

    /// Payload sepanjang yang di-reserve, langsung di memory ring
    #[inline(always)]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        // SAFETY: [offset, offset + slot) di-reserve oleh push_begin dan
        // grant meminjam producer secara eksklusif
        unsafe {
            self.ring
                .bytes_mut(self.offset + HEADER_SIZE, self.reserved as usize)
        }
    }

    /// Tulis header lalu publish write-cursor (push-end)
    #[inline(always)]
    pub fn commit(self) {
        // SAFETY: header berada di awal slot milik grant
        unsafe {
            self.header
                .write_to(self.ring.bytes_mut(self.offset, HEADER_SIZE));
        }
        // Release: header + payload visible sebelum cursor
        self.ring
            .write
            .store(self.offset + self.header.slot_size(), Ordering::Release);
    }
}

/// View sisi consumer. Hanya satu per ring.
pub struct Consumer<'a, C: Cursor, S: Storage> {
    ring: &'a RingBuffer<C, S>,
}

impl<'a, C: Cursor, S: Storage> Consumer<'a, C, S> {
    #[inline(always)]
    pub fn ring(&self) -> &'a RingBuffer<C, S> {
        self.ring
    }

    /// Lihat pesan berikutnya tanpa mengubah state (pop-begin).
    ///
    /// Sentinel turn-around diikuti secara transparan. Pesan baru dikonsumsi
    /// setelah [`ReadGrant::commit`].
    ///
    /// # Errors
    /// - [`RingError::Empty`] jika tidak ada pesan.
    /// - [`RingError::Corrupt`] jika header menunjuk ke luar buffer
    ///   (hanya mungkin kalau memory ring ditulis pihak lain).
    #[inline(always)]
    pub fn pop_begin(&mut self) -> Result<ReadGrant<'_, C, S>, RingError> {
        let ring = self.ring;
        let r = ring.read.load(Ordering::Relaxed);
        // Acquire: bytes pesan visible setelah cursor
        let w = ring.write.load(Ordering::Acquire);

        if r == w {
            return Err(RingError::Empty);
        }

        // SAFETY: r <= capacity dan [r, w) sudah dipublish producer
        let mut offset = r;
        let mut header = unsafe { ring.header_at(r) };
        if header.is_turn_around() {
            offset = 0;
            // SAFETY: producer mempublish sentinel bersama pesan di offset 0
            header = unsafe { ring.header_at(0) };
        }

        let end = checked_slot_size(header.length as usize).and_then(|s| s.checked_add(offset));
        match end {
            Some(end) if end <= ring.capacity => {}
            _ => return Err(RingError::Corrupt { offset }),
        }

        Ok(ReadGrant {
            ring,
            offset,
            header,
        })
    }

    /// Copy pesan berikutnya ke `out` lalu konsumsi.
    ///
    /// # Errors
    /// [`RingError::OutputTooSmall`] jika payload lebih panjang dari `out`;
    /// read-cursor TIDAK maju, pesan yang sama bisa di-pop lagi dengan
    /// buffer yang lebih besar.
    #[inline(always)]
    pub fn pop(&mut self, out: &mut [u8]) -> Result<MessageHeader, RingError> {
        let grant = self.pop_begin()?;
        let payload = grant.payload();
        if payload.len() > out.len() {
            return Err(RingError::OutputTooSmall {
                needed: payload.len(),
                available: out.len(),
            });
        }
        out[..payload.len()].copy_from_slice(payload);
        let header = grant.header();
        grant.commit();
        Ok(header)
    }

    /// Proses pesan berikutnya di tempat (zero-copy) lalu konsumsi
    #[inline(always)]
    pub fn pop_with<F, R>(&mut self, f: F) -> Result<R, RingError>
    where
        F: FnOnce(MessageHeader, &[u8]) -> R,
    {
        let grant = self.pop_begin()?;
        let out = f(grant.header(), grant.payload());
        grant.commit();
        Ok(out)
    }
}

/// Pesan yang sedang dilihat consumer, belum dikonsumsi
pub struct ReadGrant<'c, C: Cursor, S: Storage> {
    ring: &'c RingBuffer<C, S>,
    offset: usize,
    header: MessageHeader,
}

impl<'c, C: Cursor, S: Storage> ReadGrant<'c, C, S> {
    /// Offset header di dalam buffer (0 jika mengikuti sentinel)
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    pub fn header(&self) -> MessageHeader {
        self.header
    }

    #[inline(always)]
    pub fn msg_type(&self) -> u32 {
        self.header.msg_type
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.header.length as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.header.length == 0
    }

    /// Payload langsung dari memory ring (zero-copy)
    #[inline(always)]
    pub fn payload(&self) -> &[u8] {
        // SAFETY: batas sudah dicek di pop_begin; producer tidak menyentuh
        // slot ini sampai read-cursor melewatinya
        unsafe { self.ring.bytes(self.offset + HEADER_SIZE, self.len()) }
    }

    /// Publish read-cursor melewati pesan ini (pop-end)
    #[inline(always)]
    pub fn commit(self) {
        // Release: semua read di atas selesai sebelum slot dipakai ulang
        self.ring
            .read
            .store(self.offset + self.header.slot_size(), Ordering::Release);
    }
}
