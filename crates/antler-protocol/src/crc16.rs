//! Table-driven CRC-16 used by ANT-FS downloads and FIT files.
//!
//! This is the reflected 0xA001 polynomial computed nibble-wise from a
//! 16-entry table. The device carries the running value across download
//! packets as the "CRC seed" in each packet footer, so the host can keep its
//! own running CRC over the payload bytes and cross-check.

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401,
    0xA001, 0x6C00, 0x7800, 0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Fold one byte into a running CRC, low nibble first.
pub fn crc16_update(mut crc: u16, byte: u8) -> u16 {
    let tmp = CRC_TABLE[(crc & 0x0F) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[(byte & 0x0F) as usize];

    let tmp = CRC_TABLE[(crc & 0x0F) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0x0F) as usize]
}

/// CRC-16 over a whole buffer, starting from zero.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, &b| crc16_update(crc, b))
}

/// Streaming CRC-16 accumulator.
///
/// # Examples
///
/// ```
/// use antler_protocol::crc16::{crc16, Crc16};
///
/// let mut crc = Crc16::new();
/// crc.update(b"1234");
/// crc.update(b"56789");
/// assert_eq!(crc.value(), crc16(b"123456789"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Crc16 {
    /// Start a new accumulation from zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a carried seed.
    pub fn with_seed(seed: u16) -> Self {
        Self { value: seed }
    }

    /// Fold in a slice of bytes.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.value = crc16_update(self.value, byte);
        }
    }

    /// The current CRC value.
    pub fn value(&self) -> u16 {
        self.value
    }
}
