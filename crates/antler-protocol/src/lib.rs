//! ANT frame codec and ANT-FS wire structures.
//!
//! This crate is the pure byte layer of the antler stack: encoding and
//! decoding of ANT serial frames, the channel command builders, burst
//! chunking and reassembly, the ANT-FS session structures (beacons,
//! commands, answers, download packets, the file directory), ANT+
//! heart-rate pages, and the CRC-16 used to verify downloads. Nothing here
//! does I/O; the transport and engine crates drive these types.

pub mod antfs;
pub mod burst;
pub mod codec;
pub mod crc16;
pub mod frame;
pub mod messages;
pub mod telemetry;

pub use antfs::{
    AuthAnswer, AuthRequestKind, AuthVerdict, Beacon, BeaconDescriptor, Directory,
    DirectoryEntry, DownloadFooter, DownloadHeader, DownloadResponse, FileKind, FsCommand,
    PairingAnswer, SerialNumberAnswer,
};
pub use burst::{BURST_CHUNK_SIZE, BurstAssembler, BurstHeader, burst_packets};
pub use codec::AntCodec;
pub use crc16::{Crc16, crc16, crc16_update};
pub use frame::{AntMessage, xor_checksum};
pub use telemetry::{HeartRateData, HeartRatePage};
