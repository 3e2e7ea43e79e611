//! Async engine for driving an ANT radio.
//!
//! Layers the frame codec over a byte transport: an I/O task owns the
//! transport, a parser task turns bytes into [`AntEvent`]s, and the
//! [`AntStation`] exposes the send and wait primitives (command
//! acknowledgement, acknowledged and burst transmission, broadcast and
//! burst reception) that the ANT-FS session layer is written against.

pub mod error;
pub mod event;
mod pipeline;
pub mod state;
pub mod station;

pub use error::{EngineError, Result};
pub use event::AntEvent;
pub use state::{ProtocolState, SharedState};
pub use station::{AntStation, StationConfig};
