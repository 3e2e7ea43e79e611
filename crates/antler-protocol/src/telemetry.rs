//! ANT+ heart-rate monitor broadcast pages.
//!
//! HRM devices broadcast one 8-byte data page per channel period. All pages
//! share the last four bytes (beat time, beat count, computed heart rate);
//! bytes 1-3 are page-specific. The page number lives in the low 7 bits of
//! byte 0 and the top bit toggles every fourth message. Decoded for
//! diagnostics and the CLI listen mode; the ANT-FS session layer never
//! looks at these.

use antler_core::{Error, Result};

/// Page-specific fields of an HRM broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HeartRateData {
    /// Page 1: cumulative operating time in 2-second units.
    OperatingTime { seconds: u32 },

    /// Page 2: manufacturer id and device serial.
    ProductId { manufacturer: u8, serial: u16 },

    /// Page 3: hardware, software, and model identifiers.
    Version { hardware: u8, software: u8, model: u8 },

    /// Page 4: time of the beat before the last one, for R-R intervals.
    PreviousBeat { time: u16 },

    /// Page 0 or anything unrecognized: the common fields only.
    Plain,
}

/// One decoded HRM broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRatePage {
    /// Data page number with the toggle bit stripped.
    pub page: u8,
    pub data: HeartRateData,
    /// Time of the last beat in 1/1024 s, rolling over at 64 s.
    pub beat_time: u16,
    /// Beat counter, rolling over at 256.
    pub beat_count: u8,
    /// Computed heart rate in beats per minute; 0 means invalid.
    pub heart_rate: u8,
}

impl HeartRatePage {
    /// Encoded size (one broadcast payload).
    pub const SIZE: usize = 8;

    /// Parse a broadcast data payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for fewer than 8 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::truncated("heart-rate page", Self::SIZE, data.len()));
        }

        let page = data[0] & 0x7F;
        let page_data = match page {
            1 => HeartRateData::OperatingTime {
                seconds: 2 * u32::from_le_bytes([data[1], data[2], data[3], 0]),
            },
            2 => HeartRateData::ProductId {
                manufacturer: data[1],
                serial: u16::from_le_bytes([data[2], data[3]]),
            },
            3 => HeartRateData::Version {
                hardware: data[1],
                software: data[2],
                model: data[3],
            },
            4 => HeartRateData::PreviousBeat {
                time: u16::from_le_bytes([data[2], data[3]]),
            },
            _ => HeartRateData::Plain,
        };

        Ok(Self {
            page,
            data: page_data,
            beat_time: u16::from_le_bytes([data[4], data[5]]),
            beat_count: data[6],
            heart_rate: data[7],
        })
    }

    /// Whether the device reported a usable heart rate.
    pub fn is_valid(&self) -> bool {
        self.heart_rate != 0
    }

    /// R-R interval in 1/1024 s, available on page 4.
    ///
    /// The beat clock rolls over at 64 s, so the subtraction wraps.
    pub fn rr_interval(&self) -> Option<u16> {
        match self.data {
            HeartRateData::PreviousBeat { time } => Some(self.beat_time.wrapping_sub(time)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_toggle_bit() {
        let data = [0x84, 0xFF, 0x10, 0x27, 0x10, 0x27, 42, 65];
        let page = HeartRatePage::parse(&data).unwrap();

        assert_eq!(page.page, 4);
        assert_eq!(page.beat_time, 0x2710);
        assert_eq!(page.beat_count, 42);
        assert_eq!(page.heart_rate, 65);
        assert!(page.is_valid());
    }

    #[test]
    fn test_operating_time_page() {
        let data = [0x01, 0x10, 0x00, 0x00, 0, 0, 0, 70];
        let page = HeartRatePage::parse(&data).unwrap();
        assert_eq!(page.data, HeartRateData::OperatingTime { seconds: 32 });
    }

    #[test]
    fn test_product_id_page() {
        let data = [0x02, 0x0B, 0x34, 0x12, 0, 0, 0, 70];
        let page = HeartRatePage::parse(&data).unwrap();
        assert_eq!(
            page.data,
            HeartRateData::ProductId {
                manufacturer: 0x0B,
                serial: 0x1234
            }
        );
    }

    #[test]
    fn test_rr_interval_wraps_across_rollover() {
        // previous beat just before the 64 s rollover, last beat just after
        let data = [0x04, 0x00, 0xF0, 0xFF, 0x10, 0x00, 7, 72];
        let page = HeartRatePage::parse(&data).unwrap();
        assert_eq!(page.rr_interval(), Some(0x0020));
    }

    #[test]
    fn test_rr_interval_absent_on_other_pages() {
        let data = [0x00, 0xFF, 0xFF, 0xFF, 0, 0, 0, 70];
        assert_eq!(HeartRatePage::parse(&data).unwrap().rr_interval(), None);
    }

    #[test]
    fn test_zero_heart_rate_is_invalid() {
        let data = [0x00, 0, 0, 0, 0, 0, 0, 0];
        assert!(!HeartRatePage::parse(&data).unwrap().is_valid());
    }

    #[test]
    fn test_rejects_short_payload() {
        assert!(matches!(
            HeartRatePage::parse(&[0x04, 0, 0]),
            Err(Error::Truncated { needed: 8, got: 3, .. })
        ));
    }
}
