//! Shared constants, enumerations, and errors for the antler ANT / ANT-FS stack.
//!
//! Everything in this crate is protocol vocabulary: the numeric values are the
//! wire contract with the radio hardware and the client device, not internal
//! choices. Higher layers (framing, transport, engine, session) all build on
//! these definitions.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
