//! Message Framing: Layout satu pesan di dalam ring
//!
//! Layout:
//! ┌─────────────────────────────────────────────────────┐
//! │ MessageHeader (8 bytes, fixed)                      │
//! │   msg_type: u32 LE │ length: u32 LE                 │
//! ├─────────────────────────────────────────────────────┤
//! │ Payload (`length` bytes)                            │
//! ├─────────────────────────────────────────────────────┤
//! │ Padding sampai kelipatan 8                          │
//! └─────────────────────────────────────────────────────┘
//!
//! Header selalu di-encode little-endian, tidak tergantung endianness host.

/// Ukuran header dalam bytes
pub const HEADER_SIZE: usize = 8;

/// Alignment setiap slot pesan
pub const MESSAGE_ALIGN: usize = 8;

/// Tipe header reserved: "lompat ke offset 0 dan baca header di sana".
///
/// Bukan pesan sungguhan. Aplikasi TIDAK BOLEH memakai nilai ini
/// sebagai tipe pesan.
pub const TURN_AROUND: u32 = 0xFFFF_FFFF;

/// Bulatkan `n` ke atas ke kelipatan 8
#[inline(always)]
pub const fn message_align(n: usize) -> usize {
    (n + (MESSAGE_ALIGN - 1)) & !(MESSAGE_ALIGN - 1)
}

/// Jumlah bytes yang di-reserve untuk payload sepanjang `len`
#[inline(always)]
pub const fn slot_size(len: usize) -> usize {
    message_align(HEADER_SIZE + len)
}

/// Header di awal setiap pesan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Tipe pesan (bebas, kecuali [`TURN_AROUND`])
    pub msg_type: u32,
    /// Panjang payload dalam bytes
    pub length: u32,
}

impl MessageHeader {
    #[inline(always)]
    pub const fn new(msg_type: u32, length: u32) -> Self {
        Self { msg_type, length }
    }

    /// Header sentinel turn-around
    #[inline(always)]
    pub const fn turn_around() -> Self {
        Self {
            msg_type: TURN_AROUND,
            length: 0,
        }
    }

    #[inline(always)]
    pub const fn is_turn_around(&self) -> bool {
        self.msg_type == TURN_AROUND
    }

    /// Ukuran slot yang ditempati pesan ini (header + payload + padding)
    #[inline(always)]
    pub const fn slot_size(&self) -> usize {
        slot_size(self.length as usize)
    }

    /// Encode ke image 8 bytes
    #[inline(always)]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.msg_type.to_le_bytes());
        buf[4..8].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    /// Tulis header ke awal `buf`
    ///
    /// # Panics
    /// Panic jika `buf` lebih pendek dari [`HEADER_SIZE`]
    #[inline(always)]
    pub fn write_to(&self, buf: &mut [u8]) {
        buf[..HEADER_SIZE].copy_from_slice(&self.encode());
    }

    /// Decode dari awal `buf`. `None` jika `buf` terlalu pendek.
    #[inline(always)]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let image: &[u8; HEADER_SIZE] = buf.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self::decode_array(image))
    }

    /// Decode dari image 8 bytes persis
    #[inline(always)]
    pub const fn decode_array(image: &[u8; HEADER_SIZE]) -> Self {
        Self {
            msg_type: u32::from_le_bytes([image[0], image[1], image[2], image[3]]),
            length: u32::from_le_bytes([image[4], image[5], image[6], image[7]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        assert_eq!(message_align(0), 0);
        assert_eq!(message_align(1), 8);
        assert_eq!(message_align(8), 8);
        assert_eq!(message_align(9), 16);

        // Pesan kosong tetap butuh satu header
        assert_eq!(slot_size(0), 8);
        assert_eq!(slot_size(1), 16);
        assert_eq!(slot_size(8), 16);
        assert_eq!(slot_size(9), 24);
    }

    #[test]
    fn test_header_wire_layout() {
        let header = MessageHeader::new(0x0403_0201, 0x0807_0605);
        assert_eq!(header.encode(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_header_decode() {
        let mut buf = vec![0u8; 16];
        MessageHeader::new(0x70, 8).write_to(&mut buf[8..]);

        let parsed = MessageHeader::decode(&buf[8..]).unwrap();
        assert_eq!(parsed.msg_type, 0x70);
        assert_eq!(parsed.length, 8);
        assert_eq!(parsed.slot_size(), 16);

        assert!(MessageHeader::decode(&buf[..7]).is_none());
    }

    #[test]
    fn test_header_decode_array() {
        let image = MessageHeader::new(0x0403_0201, 12).encode();
        let parsed = MessageHeader::decode_array(&image);
        assert_eq!(parsed, MessageHeader::new(0x0403_0201, 12));
        assert_eq!(MessageHeader::decode(&image), Some(parsed));
        assert!(MessageHeader::decode_array(&MessageHeader::turn_around().encode()).is_turn_around());
    }

    #[test]
    fn test_turn_around_sentinel() {
        let sentinel = MessageHeader::turn_around();
        assert!(sentinel.is_turn_around());
        assert_eq!(sentinel.encode()[..4], [0xFF; 4]);
        assert!(!MessageHeader::new(0x11, 0).is_turn_around());
    }
}
