use thiserror::Error;

/// Errors shared by the protocol layers.
///
/// These cover frame integrity and wire-structure problems. Transport and
/// session failures have their own error types in their own crates and wrap
/// this one where needed.
#[derive(Error, Debug)]
pub enum Error {
    /// A payload longer than the one-byte length field can describe.
    #[error("payload length {size} exceeds the {max}-byte frame limit")]
    PayloadTooLarge { size: usize, max: usize },

    /// XOR over a complete frame (checksum byte included) was not zero.
    #[error("frame checksum mismatch (XOR residue 0x{residue:02X})")]
    ChecksumMismatch { residue: u8 },

    /// A wire structure declared more bytes than the buffer holds.
    #[error("{what} truncated: need {needed} bytes, got {got}")]
    Truncated {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    /// A page id that does not belong to the structure being parsed.
    #[error("{what} has unexpected page id 0x{id:02X}")]
    UnexpectedPage { what: &'static str, id: u8 },

    /// I/O failure surfaced through the framed codec.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a truncation error for a named wire structure.
    pub fn truncated(what: &'static str, needed: usize, got: usize) -> Self {
        Self::Truncated { what, needed, got }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_display() {
        let error = Error::PayloadTooLarge { size: 300, max: 255 };
        assert_eq!(
            error.to_string(),
            "payload length 300 exceeds the 255-byte frame limit"
        );
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let error = Error::ChecksumMismatch { residue: 0x5A };
        assert_eq!(error.to_string(), "frame checksum mismatch (XOR residue 0x5A)");
    }

    #[test]
    fn test_truncated_display() {
        let error = Error::truncated("download header", 24, 10);
        assert!(matches!(error, Error::Truncated { .. }));
        assert_eq!(
            error.to_string(),
            "download header truncated: need 24 bytes, got 10"
        );
    }
}
