//! ANT-FS session-layer wire structures.
//!
//! ANT-FS rides on the ANT data messages: the client advertises itself with a
//! beacon broadcast, the host issues fixed-layout commands as acknowledged or
//! burst data, and the client answers with bursts. Everything here is plain
//! byte layout: multi-byte integers are little-endian, string fields are
//! fixed-width and NUL-padded, and every parse length-checks before slicing.
//!
//! The numeric command codes and structure layouts are the wire contract
//! with the device and must not change.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use antler_core::types::{AuthType, BeaconPeriod, ClientState};
use antler_core::{Error, Result};

/// Broadcast page id of the ANT-FS client beacon.
pub const BEACON_PAGE: u8 = 0x43;

/// First byte of every ANT-FS command structure.
pub const COMMAND_PAGE: u8 = 0x44;

/// Width of fixed device/host name fields.
pub const MAX_NAME_LEN: usize = 16;

// ============================================================================
// Command and Response Codes
// ============================================================================

/// ANT-FS command byte, the second byte of every command structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FsCommand {
    Link = 0x02,
    Disconnect = 0x03,
    Authenticate = 0x04,
    Ping = 0x05,
    DownloadRequest = 0x09,
    UploadRequest = 0x0A,
    EraseRequest = 0x0B,
    UploadData = 0x0C,
}

impl FsCommand {
    /// The raw wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Sub-command of an authenticate command (its `param1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthRequestKind {
    ProceedToTransport = 0,
    SerialNumber = 1,
    Pairing = 2,
    PasskeyExchange = 3,
}

impl AuthRequestKind {
    /// The raw wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Device verdict in an authenticate answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// No verdict applies (serial-number requests answer with this).
    NotApplicable,
    Accepted,
    Rejected,
    Other(u8),
}

impl AuthVerdict {
    /// Parse the response-type byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotApplicable,
            1 => Self::Accepted,
            2 => Self::Rejected,
            other => Self::Other(other),
        }
    }
}

/// Response code in a download packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadResponse {
    Ok,
    NotExist,
    NotDownloadable,
    NotReady,
    RequestInvalid,
    CrcIncorrect,
    Other(u8),
}

impl DownloadResponse {
    /// Parse the response byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Ok,
            1 => Self::NotExist,
            2 => Self::NotDownloadable,
            3 => Self::NotReady,
            4 => Self::RequestInvalid,
            5 => Self::CrcIncorrect,
            other => Self::Other(other),
        }
    }

    /// Human-readable description for logs.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Ok => "Download Request Ok",
            Self::NotExist => "Data does not exist",
            Self::NotDownloadable => "Data exists but is not downloadable",
            Self::NotReady => "Not ready to download",
            Self::RequestInvalid => "Request invalid",
            Self::CrcIncorrect => "CRC incorrect",
            Self::Other(_) => "Unknown download response",
        }
    }
}

// ============================================================================
// Beacon
// ============================================================================

/// State-dependent tail of a beacon.
///
/// A client in [`ClientState::Link`] advertises what it is; in every other
/// state it echoes the serial number of the host it is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconDescriptor {
    /// Manufacturer and device type, advertised while unconnected.
    Device { manufacturer: u16, device_type: u16 },
    /// Serial number of the connected host.
    HostSerial(u32),
}

/// Parsed ANT-FS client beacon.
///
/// Re-parsed from every beacon broadcast; the session layer gates on
/// [`Beacon::client_state`] and checks [`Beacon::data_available`] before
/// starting downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beacon {
    pub period: BeaconPeriod,
    pub pairing_enabled: bool,
    pub upload_enabled: bool,
    pub data_available: bool,
    pub client_state: Option<ClientState>,
    pub auth_type: Option<AuthType>,
    pub descriptor: BeaconDescriptor,
}

impl Beacon {
    /// Encoded beacon size (page byte included).
    pub const SIZE: usize = 8;

    /// Parse a beacon from broadcast data starting at the page byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for fewer than 8 bytes and
    /// [`Error::UnexpectedPage`] if the page byte is not `0x43`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::truncated("beacon", Self::SIZE, data.len()));
        }
        if data[0] != BEACON_PAGE {
            return Err(Error::UnexpectedPage {
                what: "beacon",
                id: data[0],
            });
        }

        let status1 = data[1];
        let status2 = data[2];
        let client_state = ClientState::from_u8(status2 & 0x0F);

        let descriptor = if client_state == Some(ClientState::Link) {
            BeaconDescriptor::Device {
                manufacturer: u16::from_le_bytes([data[4], data[5]]),
                device_type: u16::from_le_bytes([data[6], data[7]]),
            }
        } else {
            BeaconDescriptor::HostSerial(u32::from_le_bytes([data[4], data[5], data[6], data[7]]))
        };

        Ok(Self {
            period: BeaconPeriod::from_u8(status1),
            pairing_enabled: status1 & 0x08 != 0,
            upload_enabled: status1 & 0x10 != 0,
            data_available: status1 & 0x20 != 0,
            client_state,
            auth_type: AuthType::from_u8(data[3]),
            descriptor,
        })
    }

    /// Whether the client advertises itself as busy.
    pub fn is_busy(&self) -> bool {
        self.client_state == Some(ClientState::Busy)
    }
}

// ============================================================================
// Command Builders
// ============================================================================

/// The common 8-byte command structure: code, command, two parameter bytes,
/// and the host serial number.
fn base_command(command: FsCommand, param1: u8, param2: u8, host_serial: u32) -> BytesMut {
    let mut data = BytesMut::with_capacity(8);
    data.put_u8(COMMAND_PAGE);
    data.put_u8(command.as_u8());
    data.put_u8(param1);
    data.put_u8(param2);
    data.put_u32_le(host_serial);
    data
}

/// Link command: move the client from beacon broadcasting to a dedicated
/// channel at the given frequency and beacon period. Sent as acknowledged
/// data.
pub fn link_command(frequency: u8, period: BeaconPeriod, host_serial: u32) -> Bytes {
    base_command(FsCommand::Link, frequency, period.as_u8(), host_serial).freeze()
}

/// Disconnect command. Sent as acknowledged data.
pub fn disconnect_command(return_to_broadcast: bool) -> Bytes {
    base_command(FsCommand::Disconnect, return_to_broadcast as u8, 0, 0).freeze()
}

/// Authenticate command requesting the client's serial number. Sent as
/// acknowledged data; answered with a burst of [`SerialNumberAnswer`].
pub fn serial_number_request(host_serial: u32) -> Bytes {
    base_command(
        FsCommand::Authenticate,
        AuthRequestKind::SerialNumber.as_u8(),
        0,
        host_serial,
    )
    .freeze()
}

/// Pairing request carrying the host's display name.
///
/// The name is truncated to [`MAX_NAME_LEN`] bytes and NUL-padded; its
/// effective length travels in `param2`. Exceeds one frame, so this is sent
/// as a burst; answered with a burst of [`PairingAnswer`].
pub fn pairing_request(host_serial: u32, name: &str) -> Bytes {
    let name_bytes = name.as_bytes();
    let name_len = name_bytes.len().min(MAX_NAME_LEN);

    let mut data = base_command(
        FsCommand::Authenticate,
        AuthRequestKind::Pairing.as_u8(),
        name_len as u8,
        host_serial,
    );
    data.put_slice(&name_bytes[..name_len]);
    data.put_bytes(0, MAX_NAME_LEN - name_len);
    data.freeze()
}

/// Passkey-exchange request carrying the 8-byte pairing key. Sent as a
/// burst; answered with a burst of [`AuthAnswer`].
pub fn passkey_request(host_serial: u32, key: u64) -> Bytes {
    let mut data = base_command(
        FsCommand::Authenticate,
        AuthRequestKind::PasskeyExchange.as_u8(),
        8,
        host_serial,
    );
    data.put_u64_le(key);
    data.put_u64_le(0);
    data.freeze()
}

/// Download request for a block of a file.
///
/// `crc_seed` carries the seed from the previous packet's footer (zero on
/// the first request, which also sets `initial`). A `max_block_size` of zero
/// lets the client pick its block size. Sent as a burst.
pub fn download_request(
    file_index: u16,
    offset: u32,
    initial: bool,
    crc_seed: u16,
    max_block_size: u32,
) -> Bytes {
    let mut data = BytesMut::with_capacity(16);
    data.put_u8(COMMAND_PAGE);
    data.put_u8(FsCommand::DownloadRequest.as_u8());
    data.put_u16_le(file_index);
    data.put_u32_le(offset);
    data.put_u8(0);
    data.put_u8(initial as u8);
    data.put_u16_le(crc_seed);
    data.put_u32_le(max_block_size);
    data.freeze()
}

// ============================================================================
// Answers
// ============================================================================

/// Common head of every authenticate answer burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthAnswer {
    pub host_serial: u32,
    pub verdict: AuthVerdict,
    pub auth_string_len: u8,
    pub unit_id: u32,
}

impl AuthAnswer {
    /// Encoded size.
    pub const SIZE: usize = 16;

    /// Parse from the start of a burst.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for fewer than 16 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::truncated("authenticate answer", Self::SIZE, data.len()));
        }

        let mut buf = data;
        buf.advance(4); // reserved
        let host_serial = buf.get_u32_le();
        buf.advance(2); // reserved
        let verdict = AuthVerdict::from_u8(buf.get_u8());
        let auth_string_len = buf.get_u8();
        let unit_id = buf.get_u32_le();

        Ok(Self {
            host_serial,
            verdict,
            auth_string_len,
            unit_id,
        })
    }
}

/// Answer to a serial-number request: the common head plus the unit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialNumberAnswer {
    pub unit_id: u32,
    pub unit_name: String,
}

impl SerialNumberAnswer {
    /// Encoded size.
    pub const SIZE: usize = AuthAnswer::SIZE + MAX_NAME_LEN;

    /// Parse from a complete burst.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for fewer than 32 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::truncated("serial-number answer", Self::SIZE, data.len()));
        }

        let head = AuthAnswer::parse(data)?;
        let name_field = &data[AuthAnswer::SIZE..Self::SIZE];

        Ok(Self {
            unit_id: head.unit_id,
            unit_name: fixed_string(name_field),
        })
    }
}

/// Answer to a pairing request: the common head plus a freshly issued key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingAnswer {
    pub unit_id: u32,
    pub verdict: AuthVerdict,
    pub key: u64,
}

impl PairingAnswer {
    /// Encoded size.
    pub const SIZE: usize = AuthAnswer::SIZE + 8;

    /// Parse from a complete burst.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for fewer than 24 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::truncated("pairing answer", Self::SIZE, data.len()));
        }

        let head = AuthAnswer::parse(data)?;
        let key = u64::from_le_bytes(data[AuthAnswer::SIZE..Self::SIZE].try_into().unwrap());

        Ok(Self {
            unit_id: head.unit_id,
            verdict: head.verdict,
            key,
        })
    }
}

/// Decode a fixed-width NUL-padded string field.
fn fixed_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

// ============================================================================
// Download Packets
// ============================================================================

/// Header at the front of every download answer burst.
///
/// The first eight bytes repeat the client beacon; then the command echo,
/// the response code, and the block geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadHeader {
    pub beacon: Beacon,
    pub response_to: u8,
    pub response: DownloadResponse,
    /// Bytes of file data carried in this packet.
    pub data_remain: u32,
    /// File offset of the first carried byte.
    pub data_offset: u32,
    /// Total file size; learned from the first packet.
    pub file_size: u32,
}

impl DownloadHeader {
    /// Encoded size.
    pub const SIZE: usize = 24;

    /// Parse from the start of a download burst.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for fewer than 24 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::truncated("download header", Self::SIZE, data.len()));
        }

        let beacon = Beacon::parse(&data[..Beacon::SIZE])?;

        let mut buf = &data[Beacon::SIZE..Self::SIZE];
        buf.advance(1); // command page echo
        let response_to = buf.get_u8();
        let response = DownloadResponse::from_u8(buf.get_u8());
        buf.advance(1); // zero byte
        let data_remain = buf.get_u32_le();
        let data_offset = buf.get_u32_le();
        let file_size = buf.get_u32_le();

        Ok(Self {
            beacon,
            response_to,
            response,
            data_remain,
            data_offset,
            file_size,
        })
    }
}

/// Footer closing every download answer burst: reserved bytes and the CRC
/// seed to carry into the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadFooter {
    pub crc_seed: u16,
}

impl DownloadFooter {
    /// Encoded size.
    pub const SIZE: usize = 8;

    /// Parse from the bytes following the packet's file data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] for fewer than 8 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::truncated("download footer", Self::SIZE, data.len()));
        }

        Ok(Self {
            crc_seed: u16::from_le_bytes([data[6], data[7]]),
        })
    }
}

// ============================================================================
// Directory (file index 0)
// ============================================================================

/// Record kind of a directory entry, from its record-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Activity,
    Course,
    Waypoints,
    Other(u8),
}

impl FileKind {
    /// Parse the record-type byte.
    pub fn from_u8(value: u8) -> Self {
        match value {
            4 => Self::Activity,
            6 => Self::Course,
            8 => Self::Waypoints,
            other => Self::Other(other),
        }
    }
}

/// One 16-byte directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File index to pass to a download request.
    pub index: u16,
    /// Data-type byte (0x80 marks FIT-encoded files).
    pub data_type: u8,
    pub kind: FileKind,
    pub identifier: u16,
    pub flags: u8,
    pub general_flags: u8,
    pub size: u32,
    pub timestamp: u32,
}

impl DirectoryEntry {
    const SIZE: usize = 16;

    fn parse(mut data: &[u8]) -> Self {
        let index = data.get_u16_le();
        let data_type = data.get_u8();
        let kind = FileKind::from_u8(data.get_u8());
        let identifier = data.get_u16_le();
        let flags = data.get_u8();
        let general_flags = data.get_u8();
        let size = data.get_u32_le();
        let timestamp = data.get_u32_le();

        Self {
            index,
            data_type,
            kind,
            identifier,
            flags,
            general_flags,
            size,
            timestamp,
        }
    }
}

/// The device's file directory: the download of file index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub version: u8,
    pub system_time: u32,
    pub modified_time: u32,
    pub entries: Vec<DirectoryEntry>,
}

impl Directory {
    const HEADER_SIZE: usize = 16;

    /// Parse a downloaded directory file.
    ///
    /// Trailing bytes shorter than one record are ignored, matching devices
    /// that pad the final block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the data cannot hold the header, and
    /// [`Error::UnexpectedPage`] for a record length other than 16.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::truncated("directory header", Self::HEADER_SIZE, data.len()));
        }

        let version = data[0];
        let structure_len = data[1] as usize;
        if structure_len != DirectoryEntry::SIZE {
            return Err(Error::UnexpectedPage {
                what: "directory record length",
                id: data[1],
            });
        }
        let system_time = u32::from_le_bytes(data[8..12].try_into().unwrap());
        let modified_time = u32::from_le_bytes(data[12..16].try_into().unwrap());

        let entries = data[Self::HEADER_SIZE..]
            .chunks_exact(DirectoryEntry::SIZE)
            .map(DirectoryEntry::parse)
            .collect();

        Ok(Self {
            version,
            system_time,
            modified_time,
            entries,
        })
    }

    /// Indices of all activity files, in directory order.
    pub fn activity_indices(&self) -> Vec<u16> {
        self.entries
            .iter()
            .filter(|e| e.kind == FileKind::Activity)
            .map(|e| e.index)
            .collect()
    }
}
